use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_LARGE_GAP_THRESHOLD: u32 = 50;
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 20;
pub const DEFAULT_CONTEXT_SEPARATOR: &str = " - ";

const ENGLISH_ORDINALS: &str = "One|Two|Three|Four|Five|Six|Seven|Eight|Nine|Ten|Eleven|Twelve|\
Thirteen|Fourteen|Fifteen|Sixteen|Seventeen|Eighteen|Nineteen|Twenty|First|Second|Third|Fourth|\
Fifth|Sixth|Seventh|Eighth|Ninth|Tenth";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vi => "vi",
            Self::En => "en",
        }
    }
}

/// Regex sources for the four structural header levels, plus the keyword the
/// indexer uses to derive chunk identifiers.
///
/// Patterns are written without anchors; the pipeline anchors them at line
/// start (or at a word boundary for inline restoration) and always matches
/// case-insensitively. Roman numerals opt back into case-sensitive matching
/// with `(?-i:...)`, otherwise "chapter did" would open a chapter. The article
/// pattern must capture the article number in a group named `number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderVocabulary {
    pub part_pattern: String,
    pub chapter_pattern: String,
    pub section_pattern: String,
    pub article_pattern: String,
    pub article_keyword: String,
    pub label_prefix: String,
}

impl HeaderVocabulary {
    pub fn vietnamese() -> Self {
        Self {
            part_pattern: r"Phần thứ".to_string(),
            chapter_pattern: r"Chương (?-i:[IVXLCDM]+)\b".to_string(),
            section_pattern: r"Mục \d+".to_string(),
            article_pattern: r"Điều (?P<number>\d+)".to_string(),
            article_keyword: "Điều".to_string(),
            label_prefix: "Thuộc ".to_string(),
        }
    }

    pub fn english() -> Self {
        Self {
            part_pattern: format!(r"Part (?:{ENGLISH_ORDINALS}|(?-i:[IVXLCDM]+)|\d+)\b"),
            chapter_pattern: r"Chapter (?-i:[IVXLCDM]+)\b".to_string(),
            section_pattern: r"Section \d+".to_string(),
            article_pattern: r"Article (?P<number>\d+)".to_string(),
            article_keyword: "Article".to_string(),
            label_prefix: String::new(),
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Vi => Self::vietnamese(),
            Language::En => Self::english(),
        }
    }
}

impl Default for HeaderVocabulary {
    fn default() -> Self {
        Self::vietnamese()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub vocabulary: HeaderVocabulary,
    /// Words that, when they end the previous line, mark a following
    /// article header as an in-prose citation.
    pub connective_words: Vec<String>,
    pub large_gap_threshold: u32,
    pub min_chunk_chars: usize,
    pub context_separator: String,
    pub split_inline_headers: bool,
}

impl ChunkerConfig {
    pub fn for_language(language: Language) -> Self {
        Self {
            vocabulary: HeaderVocabulary::for_language(language),
            connective_words: default_connective_words(language),
            large_gap_threshold: DEFAULT_LARGE_GAP_THRESHOLD,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            context_separator: DEFAULT_CONTEXT_SEPARATOR.to_string(),
            split_inline_headers: false,
        }
    }

    /// Overlays a JSON config file onto `self`. Keys absent from the file keep
    /// their current value, so a file can tune a single knob of a preset.
    pub fn overlay_file(self, path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read chunker config {}", path.display()))?;
        let overlay: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse chunker config {}", path.display()))?;
        self.overlay_value(overlay)
            .with_context(|| format!("invalid chunker config {}", path.display()))
    }

    pub fn overlay_value(self, overlay: Value) -> Result<Self> {
        let mut base = serde_json::to_value(&self).context("failed to serialize chunker config")?;
        merge_json(&mut base, overlay);
        let merged = serde_json::from_value(base).context("failed to decode merged config")?;
        Ok(merged)
    }
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::for_language(Language::Vi)
    }
}

pub fn default_connective_words(language: Language) -> Vec<String> {
    let words: &[&str] = match language {
        Language::Vi => &[
            "tại", "của", "theo", "khoản", "điểm", "mục", "trong", "với", "và", "hoặc",
        ],
        Language::En => &[
            "at",
            "of",
            "to",
            "in",
            "with",
            "and",
            "or",
            "under",
            "by",
            "per",
            "clause",
            "point",
            "paragraph",
        ],
    };

    words.iter().map(|word| (*word).to_string()).collect()
}
