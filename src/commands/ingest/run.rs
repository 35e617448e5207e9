use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::chunking::{ChunkPipeline, ChunkReport};
use crate::cli::{IngestArgs, default_db_path};
use crate::commands::inventory::{default_manifest_path, describe_source, load_manifest};
use crate::commands::records::build_chunk_records;
use crate::model::{
    IngestCounts, IngestPaths, IngestRunManifest, SourceEntry, SourceInventoryManifest,
};
use crate::util::{
    ensure_directory, now_utc_string, read_source_text, utc_compact_string, write_json_pretty,
};

use super::db::{
    DB_SCHEMA_VERSION, InsertStats, configure_connection, count_knowledge_base_rows,
    ensure_schema, insert_records,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityCheck {
    MatchedExpectedHash,
    MatchedInventory,
    Skipped,
}

impl IntegrityCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatchedExpectedHash => "matched_expected_hash",
            Self::MatchedInventory => "matched_inventory",
            Self::Skipped => "skipped",
        }
    }
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("ingest-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&cache_root));
    let source_label = resolve_source_label(args.source_label.as_deref(), &args.source);

    let config = args.chunker.resolve()?;
    let pipeline = ChunkPipeline::new(config)?;

    info!(
        source = %args.source.display(),
        source_label = %source_label,
        run_id = %run_id,
        "starting ingest"
    );

    let source = describe_source(&args.source)?;
    let inventory = load_manifest(&default_manifest_path(&cache_root))?;
    let integrity = verify_integrity(&source, args.expected_sha256.as_deref(), inventory.as_ref())?;
    match integrity {
        IntegrityCheck::Skipped => {
            warn!(sha256 = %source.sha256, "no expected hash configured; integrity check skipped")
        }
        _ => info!(sha256 = %source.sha256, check = integrity.as_str(), "source integrity verified"),
    }

    let raw_text = read_source_text(&args.source)?;
    let report = pipeline.process_with_report(&raw_text);
    let records = build_chunk_records(&report.chunks, &pipeline.config().vocabulary.article_keyword);

    let mut warnings = Vec::new();
    let (status, insert_stats, records_total) = if records.is_empty() {
        let warning = format!("no chunks produced from {}", args.source.display());
        warn!(warning = %warning, "nothing to import");
        warnings.push(warning);
        ("no_chunks", InsertStats::default(), 0)
    } else {
        let mut connection = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        let stats = insert_records(&mut connection, &source_label, &records)?;
        let total = count_knowledge_base_rows(&connection)?;
        info!(
            inserted = stats.inserted,
            skipped_existing = stats.skipped_existing,
            total,
            "stored chunk records"
        );
        ("completed", stats, total)
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        source_label,
        language: args.chunker.language.as_str().to_string(),
        source,
        integrity_check: integrity.as_str().to_string(),
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            source_path: args.source.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: ingest_counts(report, insert_stats, records_total),
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(status, records = records.len(), "ingest completed");

    Ok(())
}

/// Refuses the import when the source does not hash to the expected value.
/// An explicit hash wins over the inventory entry for the same filename.
pub fn verify_integrity(
    source: &SourceEntry,
    expected_sha256: Option<&str>,
    inventory: Option<&SourceInventoryManifest>,
) -> Result<IntegrityCheck> {
    let actual = source.sha256.to_ascii_lowercase();

    if let Some(expected) = expected_sha256.map(str::trim).filter(|value| !value.is_empty()) {
        if expected.to_ascii_lowercase() != actual {
            bail!(
                "source {} changed: sha256 {} does not match expected {}; refusing to import",
                source.filename,
                actual,
                expected
            );
        }
        return Ok(IntegrityCheck::MatchedExpectedHash);
    }

    let recorded = inventory.and_then(|manifest| {
        manifest
            .sources
            .iter()
            .find(|entry| entry.filename == source.filename)
    });
    match recorded {
        Some(entry) if entry.sha256.to_ascii_lowercase() != actual => bail!(
            "source {} changed since inventory: sha256 {} does not match recorded {}; refusing to import",
            source.filename,
            actual,
            entry.sha256
        ),
        Some(_) => Ok(IntegrityCheck::MatchedInventory),
        None => Ok(IntegrityCheck::Skipped),
    }
}

pub fn resolve_source_label(explicit: Option<&str>, source: &Path) -> String {
    explicit
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| {
            source
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn ingest_counts(report: ChunkReport, stats: InsertStats, records_total: i64) -> IngestCounts {
    IngestCounts {
        records_inserted: stats.inserted,
        records_skipped_existing: stats.skipped_existing,
        records_total,
        pipeline: report,
    }
}

fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "statute-chunker".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--source".to_string(),
        args.source.display().to_string(),
        "--language".to_string(),
        args.chunker.language.as_str().to_string(),
    ];

    if let Some(label) = &args.source_label {
        command.push("--source-label".to_string());
        command.push(label.clone());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.ingest_manifest_path {
        command.push("--ingest-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.expected_sha256.is_some() {
        command.push("--expected-sha256".to_string());
        command.push("<redacted>".to_string());
    }
    if let Some(path) = &args.chunker.config {
        command.push("--config".to_string());
        command.push(path.display().to_string());
    }
    if let Some(threshold) = args.chunker.gap_threshold {
        command.push("--gap-threshold".to_string());
        command.push(threshold.to_string());
    }
    if let Some(min_chars) = args.chunker.min_chunk_chars {
        command.push("--min-chunk-chars".to_string());
        command.push(min_chars.to_string());
    }
    if args.chunker.split_inline_headers {
        command.push("--split-inline-headers".to_string());
    }

    command.join(" ")
}
