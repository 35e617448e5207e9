use std::collections::HashSet;

use tracing::debug;

use super::headers::{HeaderKind, HeaderPatterns};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralContext {
    part: String,
    chapter: String,
    section: String,
}

impl StructuralContext {
    pub fn set_part(&mut self, header: &str) {
        self.part = header.to_string();
        self.chapter.clear();
        self.section.clear();
    }

    pub fn set_chapter(&mut self, header: &str) {
        self.chapter = header.to_string();
        self.section.clear();
    }

    pub fn set_section(&mut self, header: &str) {
        self.section = header.to_string();
    }

    /// Non-empty levels joined outermost first, or `None` before the first
    /// header.
    pub fn label(&self, separator: &str) -> Option<String> {
        let levels = [&self.part, &self.chapter, &self.section]
            .into_iter()
            .filter(|level| !level.is_empty())
            .map(String::as_str)
            .collect::<Vec<&str>>();

        if levels.is_empty() {
            None
        } else {
            Some(levels.join(separator))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChunk {
    pub context_label: Option<String>,
    pub content: String,
}

#[derive(Debug)]
pub struct Segmenter<'a> {
    patterns: &'a HeaderPatterns,
    connective_words: HashSet<String>,
    min_chunk_chars: usize,
    context_separator: &'a str,
    label_prefix: &'a str,
}

impl<'a> Segmenter<'a> {
    pub fn new(
        patterns: &'a HeaderPatterns,
        connective_words: &[String],
        min_chunk_chars: usize,
        context_separator: &'a str,
        label_prefix: &'a str,
    ) -> Self {
        Self {
            patterns,
            connective_words: connective_words
                .iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
            min_chunk_chars,
            context_separator,
            label_prefix,
        }
    }

    pub fn segment(&self, text: &str) -> Vec<CandidateChunk> {
        let mut chunks = Vec::new();
        let mut context = StructuralContext::default();
        let mut article_lines: Vec<&str> = Vec::new();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            match self.patterns.classify(line) {
                Some(HeaderKind::Part) => {
                    self.close_article(&mut article_lines, &context, &mut chunks);
                    context.set_part(line);
                }
                Some(HeaderKind::Chapter) => {
                    self.close_article(&mut article_lines, &context, &mut chunks);
                    context.set_chapter(line);
                }
                Some(HeaderKind::Section) => {
                    self.close_article(&mut article_lines, &context, &mut chunks);
                    context.set_section(line);
                }
                Some(HeaderKind::Article) if self.is_article_start(&article_lines) => {
                    self.close_article(&mut article_lines, &context, &mut chunks);
                    article_lines.push(line);
                }
                Some(HeaderKind::Article) => {
                    debug!(line = %preview(line), "article header follows a connective, kept as prose");
                    article_lines.push(line);
                }
                None => {
                    if !article_lines.is_empty() {
                        article_lines.push(line);
                    }
                }
            }
        }

        self.close_article(&mut article_lines, &context, &mut chunks);
        chunks
    }

    fn is_article_start(&self, article_lines: &[&str]) -> bool {
        let Some(previous) = article_lines.last() else {
            return true;
        };

        let last_word = trailing_word(previous);
        !self.connective_words.contains(&last_word)
    }

    fn close_article(
        &self,
        article_lines: &mut Vec<&str>,
        context: &StructuralContext,
        chunks: &mut Vec<CandidateChunk>,
    ) {
        if article_lines.is_empty() {
            return;
        }

        let body = article_lines.join(" ").trim().to_string();
        article_lines.clear();

        if body.chars().count() <= self.min_chunk_chars {
            debug!(body = %body, "dropped near-empty article fragment");
            return;
        }

        let context_label = context.label(self.context_separator);
        let content = match &context_label {
            Some(label) => format!("[{}{}]\n{}", self.label_prefix, label, body),
            None => body,
        };

        debug!(
            context = context_label.as_deref().unwrap_or_default(),
            chars = content.chars().count(),
            "closed article candidate"
        );
        chunks.push(CandidateChunk {
            context_label,
            content,
        });
    }
}

/// Last whitespace-delimited word of `line`, lower-cased, with everything but
/// letters, digits and underscores removed.
pub fn trailing_word(line: &str) -> String {
    line.split_whitespace()
        .last()
        .unwrap_or_default()
        .chars()
        .filter(|character| character.is_alphanumeric() || *character == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn preview(line: &str) -> String {
    line.chars().take(80).collect()
}
