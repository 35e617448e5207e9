//! Splits the text layer of a statutory code into article chunks annotated
//! with their Part / Chapter / Section context.
//!
//! The pipeline runs three passes over one buffer: whitespace normalization,
//! a line state machine that emits candidate chunks, and a sequence filter
//! that keeps the ascending article run and drops in-prose citations.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

mod config;
mod headers;
mod normalize;
mod segment;
mod sequence;

pub use self::config::{ChunkerConfig, HeaderVocabulary, Language};
pub use self::sequence::{SequenceDecision, SequenceVerdict};

use self::headers::HeaderPatterns;
use self::normalize::{normalize_text, split_inline_headers};
use self::segment::Segmenter;
use self::sequence::{SequenceValidator, number_chunks};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkReport {
    pub raw_char_count: usize,
    pub normalized_char_count: usize,
    pub candidate_count: usize,
    pub numbered_count: usize,
    pub duplicate_or_backward_count: usize,
    pub forward_reference_count: usize,
    pub distant_reference_count: usize,
    pub accepted_gap_count: usize,
    #[serde(skip)]
    pub normalized_text: String,
    #[serde(skip)]
    pub verdicts: Vec<SequenceVerdict>,
    #[serde(skip)]
    pub chunks: Vec<String>,
}

#[derive(Debug)]
pub struct ChunkPipeline {
    config: ChunkerConfig,
    patterns: HeaderPatterns,
}

impl ChunkPipeline {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        let patterns = HeaderPatterns::compile(&config.vocabulary)?;
        Ok(Self { config, patterns })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn process(&self, raw_text: &str) -> Vec<String> {
        self.process_with_report(raw_text).chunks
    }

    pub fn process_with_report(&self, raw_text: &str) -> ChunkReport {
        let mut normalized = normalize_text(raw_text, &self.patterns);
        if self.config.split_inline_headers {
            normalized = split_inline_headers(&normalized, &self.patterns);
        }

        let segmenter = Segmenter::new(
            &self.patterns,
            &self.config.connective_words,
            self.config.min_chunk_chars,
            &self.config.context_separator,
            &self.config.vocabulary.label_prefix,
        );
        let candidates = segmenter.segment(&normalized);
        let normalized_char_count = normalized.chars().count();
        let numbered = number_chunks(&candidates, &self.patterns);
        let outcome = SequenceValidator::new(self.config.large_gap_threshold).validate(&numbered);

        let count_of = |decision: SequenceDecision| {
            outcome
                .verdicts
                .iter()
                .filter(|verdict| verdict.decision == decision)
                .count()
        };

        let report = ChunkReport {
            raw_char_count: raw_text.chars().count(),
            normalized_char_count,
            candidate_count: candidates.len(),
            numbered_count: numbered.len(),
            duplicate_or_backward_count: count_of(SequenceDecision::DuplicateOrBackward),
            forward_reference_count: count_of(SequenceDecision::ForwardReference),
            distant_reference_count: count_of(SequenceDecision::DistantReference),
            accepted_gap_count: count_of(SequenceDecision::AcceptedGap),
            normalized_text: normalized,
            verdicts: outcome.verdicts,
            chunks: outcome.accepted,
        };

        info!(
            kept = report.chunks.len(),
            candidates = report.candidate_count,
            numbered = report.numbered_count,
            forward_refs = report.forward_reference_count,
            duplicates = report.duplicate_or_backward_count,
            "sequence filter complete"
        );

        report
    }
}
