use anyhow::{Context, Result, bail};
use regex::Regex;

use super::config::HeaderVocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Part,
    Chapter,
    Section,
    Article,
}

#[derive(Debug)]
pub struct HeaderPatterns {
    part_line: Regex,
    chapter_line: Regex,
    section_line: Regex,
    article_line: Regex,
    inline_header: Regex,
    article_number: Regex,
}

impl HeaderPatterns {
    pub fn compile(vocabulary: &HeaderVocabulary) -> Result<Self> {
        let article_number = Regex::new(&format!(
            r"(?i)(?:^|\n)(?:{})",
            vocabulary.article_pattern
        ))
        .context("failed to compile article number regex")?;

        let has_number_group = article_number
            .capture_names()
            .flatten()
            .any(|name| name == "number");
        if !has_number_group {
            bail!(
                "article pattern '{}' must capture the article number as (?P<number>...)",
                vocabulary.article_pattern
            );
        }

        Ok(Self {
            part_line: line_start_regex(&vocabulary.part_pattern, "part")?,
            chapter_line: line_start_regex(&vocabulary.chapter_pattern, "chapter")?,
            section_line: line_start_regex(&vocabulary.section_pattern, "section")?,
            article_line: line_start_regex(&vocabulary.article_pattern, "article")?,
            inline_header: Regex::new(&format!(
                r"(?i)\b(?:{}|{}|{}|{})",
                vocabulary.part_pattern,
                vocabulary.chapter_pattern,
                vocabulary.section_pattern,
                vocabulary.article_pattern
            ))
            .context("failed to compile inline header regex")?,
            article_number,
        })
    }

    /// Header level of a trimmed line, checked in part > chapter > section >
    /// article priority.
    pub fn classify(&self, line: &str) -> Option<HeaderKind> {
        if self.part_line.is_match(line) {
            Some(HeaderKind::Part)
        } else if self.chapter_line.is_match(line) {
            Some(HeaderKind::Chapter)
        } else if self.section_line.is_match(line) {
            Some(HeaderKind::Section)
        } else if self.article_line.is_match(line) {
            Some(HeaderKind::Article)
        } else {
            None
        }
    }

    pub fn starts_with_header(&self, line: &str) -> bool {
        self.classify(line).is_some()
    }

    /// Byte offsets of header keywords that appear after the start of `line`.
    pub fn inline_header_offsets<'a>(&'a self, line: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.inline_header
            .find_iter(line)
            .map(|found| found.start())
            .filter(|start| *start > 0)
    }

    /// First article number found at the start of `content` or right after a
    /// newline. Zero and out-of-range numbers count as absent.
    pub fn article_number(&self, content: &str) -> Option<u32> {
        let captures = self.article_number.captures(content)?;
        captures
            .name("number")
            .and_then(|value| value.as_str().parse::<u32>().ok())
            .filter(|number| *number > 0)
    }
}

fn line_start_regex(pattern: &str, level: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i)^(?:{pattern})"))
        .with_context(|| format!("failed to compile {level} header regex '{pattern}'"))
}
