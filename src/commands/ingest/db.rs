use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::ChunkRecord;
use crate::util::{now_utc_string, sha256_text};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertStats {
    pub inserted: usize,
    pub skipped_existing: usize,
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS knowledge_base (
              id INTEGER PRIMARY KEY,
              source TEXT NOT NULL,
              chunk_id TEXT NOT NULL,
              seq INTEGER NOT NULL,
              content TEXT NOT NULL,
              content_sha256 TEXT NOT NULL,
              created_at TEXT NOT NULL,
              UNIQUE(source, chunk_id)
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_base_source ON knowledge_base(source);
            ",
        )
        .context("failed to initialize knowledge_base schema")?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

/// Records whose `(source, chunk_id)` already exists are left untouched.
pub fn insert_records(
    connection: &mut Connection,
    source_label: &str,
    records: &[ChunkRecord],
) -> Result<InsertStats> {
    let tx = connection.transaction()?;
    let mut stats = InsertStats::default();
    let created_at = now_utc_string();

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO knowledge_base(source, chunk_id, seq, content, content_sha256, created_at)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(source, chunk_id) DO NOTHING
            ",
        )?;

        for record in records {
            let seq = i64::try_from(record.seq)
                .with_context(|| format!("chunk seq out of range: {}", record.seq))?;
            let changed = statement.execute(params![
                source_label,
                &record.chunk_id,
                seq,
                &record.content,
                sha256_text(&record.content),
                &created_at
            ])?;

            if changed == 0 {
                stats.skipped_existing += 1;
            } else {
                stats.inserted += 1;
            }
        }
    }

    tx.commit()?;
    Ok(stats)
}

pub fn count_knowledge_base_rows(connection: &Connection) -> Result<i64> {
    let count = connection
        .query_row("SELECT COUNT(*) FROM knowledge_base", [], |row| row.get(0))
        .context("failed to count knowledge_base rows")?;
    Ok(count)
}

pub fn knowledge_base_exists(connection: &Connection) -> Result<bool> {
    let name: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'knowledge_base'",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("failed to inspect sqlite_master")?;
    Ok(name.is_some())
}

pub fn records_per_source(connection: &Connection) -> Result<Vec<(String, i64)>> {
    let mut statement = connection.prepare(
        "SELECT source, COUNT(*) FROM knowledge_base GROUP BY source ORDER BY source",
    )?;
    let rows = statement
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<(String, i64)>>>()
        .context("failed to count knowledge_base rows per source")?;
    Ok(rows)
}

/// Returns whether a table was actually dropped.
pub fn drop_knowledge_base(connection: &Connection) -> Result<bool> {
    if !knowledge_base_exists(connection)? {
        return Ok(false);
    }

    connection
        .execute_batch("DROP TABLE knowledge_base;")
        .context("failed to drop knowledge_base")?;
    Ok(true)
}
