use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::chunking::{ChunkerConfig, Language};

#[derive(Parser, Debug)]
#[command(
    name = "statute-chunker",
    version,
    about = "Split extracted statutory code text into context-annotated article chunks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Chunk(ChunkArgs),
    Ingest(IngestArgs),
    Status(StatusArgs),
    Reset(ResetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChunkerArgs {
    #[arg(long, value_enum, default_value_t = Language::Vi)]
    pub language: Language,

    /// JSON file overlaying the language preset.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub gap_threshold: Option<u32>,

    #[arg(long)]
    pub min_chunk_chars: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub split_inline_headers: bool,
}

impl ChunkerArgs {
    pub fn resolve(&self) -> Result<ChunkerConfig> {
        let mut config = ChunkerConfig::for_language(self.language);
        if let Some(path) = &self.config {
            config = config.overlay_file(path)?;
        }
        if let Some(threshold) = self.gap_threshold {
            config.large_gap_threshold = threshold;
        }
        if let Some(min_chars) = self.min_chunk_chars {
            config.min_chunk_chars = min_chars;
        }
        if self.split_inline_headers {
            config.split_inline_headers = true;
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/statutes")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub source_root: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 300)]
    pub preview_chars: usize,

    #[command(flatten)]
    pub chunker: ChunkerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/statutes")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub source: PathBuf,

    /// Label stored with every record; defaults to the source file stem.
    #[arg(long)]
    pub source_label: Option<String>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long, env = "DATA_INTEGRITY_HASH")]
    pub expected_sha256: Option<String>,

    #[command(flatten)]
    pub chunker: ChunkerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/statutes")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    #[arg(long, default_value = ".cache/statutes")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn default_db_path(cache_root: &std::path::Path) -> PathBuf {
    cache_root.join("knowledge_base.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_args_resolve_overrides_preset() {
        let cli = Cli::parse_from([
            "statute-chunker",
            "chunk",
            "--source",
            "code.txt",
            "--language",
            "en",
            "--gap-threshold",
            "12",
            "--split-inline-headers",
        ]);

        let Commands::Chunk(args) = cli.command else {
            panic!("expected chunk command");
        };
        let config = args.chunker.resolve().expect("config should resolve");

        assert_eq!(config.large_gap_threshold, 12);
        assert!(config.split_inline_headers);
        assert_eq!(config.vocabulary.article_keyword, "Article");
        assert_eq!(config.min_chunk_chars, 20);
    }

    #[test]
    fn ingest_defaults_to_vietnamese_preset() {
        let cli = Cli::parse_from(["statute-chunker", "ingest", "--source", "code.txt"]);

        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest command");
        };
        assert_eq!(args.chunker.language, Language::Vi);
        assert_eq!(args.cache_root, PathBuf::from(".cache/statutes"));
    }
}
