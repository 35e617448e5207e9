use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{ResetArgs, default_db_path};
use crate::commands::ingest::{configure_connection, drop_knowledge_base};

pub fn run(args: ResetArgs) -> Result<()> {
    let db_path = args
        .db_path
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing; nothing to reset");
        return Ok(());
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&conn)?;

    if drop_knowledge_base(&conn)? {
        info!(path = %db_path.display(), "dropped knowledge_base table");
    } else {
        info!(path = %db_path.display(), "knowledge_base table already absent");
    }

    Ok(())
}
