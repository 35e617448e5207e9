use std::collections::BTreeSet;
use std::ops::Bound;

use serde::Serialize;
use tracing::debug;

use super::headers::HeaderPatterns;
use super::segment::CandidateChunk;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedChunk<'a> {
    pub number: u32,
    pub content: &'a str,
}

/// Candidates whose content carries no article number are dropped here.
pub fn number_chunks<'a>(
    candidates: &'a [CandidateChunk],
    patterns: &HeaderPatterns,
) -> Vec<NumberedChunk<'a>> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let Some(number) = patterns.article_number(&candidate.content) else {
                debug!(
                    context = candidate.context_label.as_deref().unwrap_or_default(),
                    "candidate carries no article number"
                );
                return None;
            };
            Some(NumberedChunk {
                number,
                content: candidate.content.as_str(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceDecision {
    Accepted,
    AcceptedGap,
    DuplicateOrBackward,
    ForwardReference,
    DistantReference,
}

impl SequenceDecision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedGap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceVerdict {
    pub number: u32,
    pub decision: SequenceDecision,
}

#[derive(Debug, Clone, Default)]
pub struct SequenceOutcome {
    pub accepted: Vec<String>,
    pub verdicts: Vec<SequenceVerdict>,
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceValidator {
    large_gap_threshold: u32,
}

impl SequenceValidator {
    pub fn new(large_gap_threshold: u32) -> Self {
        Self {
            large_gap_threshold,
        }
    }

    /// Rebuilds the ascending article run. A jump past the expected number is
    /// taken as a citation whenever the expected number (or, for jumps beyond
    /// the threshold, any closer number) still exists somewhere in the
    /// document.
    pub fn validate(&self, numbered: &[NumberedChunk<'_>]) -> SequenceOutcome {
        let available = numbered
            .iter()
            .map(|chunk| chunk.number)
            .collect::<BTreeSet<u32>>();

        let mut outcome = SequenceOutcome::default();
        let mut current = 0u32;

        for chunk in numbered {
            let decision = self.decide(chunk.number, current, &available);
            debug!(
                number = chunk.number,
                current,
                decision = ?decision,
                "sequence decision"
            );

            if decision.is_accepted() {
                outcome.accepted.push(chunk.content.to_string());
                current = chunk.number;
            }
            outcome.verdicts.push(SequenceVerdict {
                number: chunk.number,
                decision,
            });
        }

        outcome
    }

    fn decide(&self, number: u32, current: u32, available: &BTreeSet<u32>) -> SequenceDecision {
        if number <= current {
            return SequenceDecision::DuplicateOrBackward;
        }

        let expected = current.saturating_add(1);
        if number == expected {
            return SequenceDecision::Accepted;
        }

        if available.contains(&expected) {
            return SequenceDecision::ForwardReference;
        }

        if number - current > self.large_gap_threshold {
            let closest_upcoming = available
                .range((Bound::Excluded(current), Bound::Unbounded))
                .next()
                .copied();
            if closest_upcoming.is_some_and(|closest| closest < number) {
                return SequenceDecision::DistantReference;
            }
        }

        SequenceDecision::AcceptedGap
    }
}
