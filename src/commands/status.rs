use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{StatusArgs, default_db_path};
use crate::commands::ingest::{knowledge_base_exists, records_per_source};
use crate::commands::inventory::{default_manifest_path, load_manifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = default_manifest_path(&args.cache_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match load_manifest(&inventory_path)? {
        Some(inventory) => {
            info!(
                generated_at = %inventory.generated_at,
                source_count = inventory.source_count,
                "loaded inventory manifest"
            );
            for source in &inventory.sources {
                info!(
                    filename = %source.filename,
                    bytes = source.byte_len,
                    sha256 = %source.sha256,
                    "inventoried source"
                );
            }
        }
        None => warn!(path = %inventory_path.display(), "inventory manifest missing"),
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    if !knowledge_base_exists(&conn)? {
        warn!(path = %db_path.display(), "knowledge_base table missing");
        return Ok(());
    }

    let per_source = records_per_source(&conn)?;
    let total: i64 = per_source.iter().map(|(_, count)| count).sum();
    for (source, count) in &per_source {
        info!(source = %source, records = count, "knowledge_base source");
    }
    info!(
        path = %db_path.display(),
        sources = per_source.len(),
        records = total,
        "database status"
    );

    Ok(())
}
