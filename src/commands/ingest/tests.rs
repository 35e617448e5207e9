use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde_json::Value;

use super::db::*;
use super::run::*;
use crate::chunking::Language;
use crate::cli::{ChunkerArgs, IngestArgs, default_db_path};
use crate::model::{ChunkRecord, SourceEntry, SourceInventoryManifest};

fn source_entry(sha256: &str) -> SourceEntry {
    SourceEntry {
        filename: "bo_luat_dan_su.txt".to_string(),
        byte_len: 42,
        sha256: sha256.to_string(),
    }
}

fn inventory_with(sha256: &str) -> SourceInventoryManifest {
    SourceInventoryManifest {
        manifest_version: 1,
        generated_at: "now".to_string(),
        source_directory: ".cache/statutes/raw".to_string(),
        source_count: 1,
        sources: vec![source_entry(sha256)],
    }
}

fn record(seq: usize, chunk_id: &str) -> ChunkRecord {
    ChunkRecord {
        seq,
        chunk_id: chunk_id.to_string(),
        content: format!("[Thuộc Chương I]\n{} nội dung", chunk_id.replace('_', " ")),
    }
}

fn ingest_args(cache_root: &Path, source: PathBuf, manifest_name: &str) -> IngestArgs {
    IngestArgs {
        cache_root: cache_root.to_path_buf(),
        source,
        source_label: None,
        db_path: None,
        ingest_manifest_path: Some(cache_root.join("manifests").join(manifest_name)),
        expected_sha256: None,
        chunker: ChunkerArgs {
            language: Language::En,
            config: None,
            gap_threshold: None,
            min_chunk_chars: None,
            split_inline_headers: false,
        },
    }
}

fn write_source(cache_root: &Path, name: &str, text: &str) -> PathBuf {
    let raw_dir = cache_root.join("raw");
    fs::create_dir_all(&raw_dir).expect("raw dir should be created");
    let path = raw_dir.join(name);
    fs::write(&path, text).expect("source should be written");
    path
}

fn read_manifest(args: &IngestArgs) -> Value {
    let path = args
        .ingest_manifest_path
        .as_ref()
        .expect("manifest path is set");
    let raw = fs::read(path).expect("run manifest should exist");
    serde_json::from_slice(&raw).expect("run manifest should parse")
}

fn in_memory_db() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory DB should open");
    ensure_schema(&connection).expect("schema should initialize");
    connection
}

#[test]
fn verify_integrity_accepts_matching_expected_hash_case_insensitively() {
    let source = source_entry("abc123");

    let check = verify_integrity(&source, Some("  ABC123 "), None).expect("hash should match");

    assert_eq!(check, IntegrityCheck::MatchedExpectedHash);
}

#[test]
fn verify_integrity_refuses_changed_source() {
    let source = source_entry("abc123");

    let err = verify_integrity(&source, Some("def456"), None).expect_err("mismatch must fail");

    assert!(err.to_string().contains("refusing to import"));
}

#[test]
fn verify_integrity_falls_back_to_inventory_entry() {
    let source = source_entry("abc123");

    let matched = verify_integrity(&source, None, Some(&inventory_with("abc123")))
        .expect("inventory hash should match");
    assert_eq!(matched, IntegrityCheck::MatchedInventory);

    assert!(verify_integrity(&source, None, Some(&inventory_with("fff000"))).is_err());
}

#[test]
fn verify_integrity_skips_without_any_reference_hash() {
    let source = source_entry("abc123");

    let check = verify_integrity(&source, Some("   "), None).expect("nothing to compare");

    assert_eq!(check, IntegrityCheck::Skipped);
}

#[test]
fn resolve_source_label_prefers_explicit_label_then_file_stem() {
    let path = Path::new("/data/raw/bo_luat_dan_su.txt");

    assert_eq!(resolve_source_label(Some("BLDS 2015"), path), "BLDS 2015");
    assert_eq!(resolve_source_label(Some("  "), path), "bo_luat_dan_su");
    assert_eq!(resolve_source_label(None, path), "bo_luat_dan_su");
}

#[test]
fn insert_records_skips_existing_chunk_ids_on_rerun() {
    let mut connection = in_memory_db();
    let records = vec![record(1, "Điều_1"), record(2, "Điều_2")];

    let first = insert_records(&mut connection, "blds", &records).expect("first insert");
    let second = insert_records(&mut connection, "blds", &records).expect("second insert");

    assert_eq!(
        first,
        InsertStats {
            inserted: 2,
            skipped_existing: 0
        }
    );
    assert_eq!(
        second,
        InsertStats {
            inserted: 0,
            skipped_existing: 2
        }
    );
    assert_eq!(
        count_knowledge_base_rows(&connection).expect("count"),
        2
    );
}

#[test]
fn records_per_source_groups_by_source_label() {
    let mut connection = in_memory_db();
    insert_records(&mut connection, "blds", &[record(1, "Điều_1"), record(2, "Điều_2")])
        .expect("insert blds");
    insert_records(&mut connection, "bllđ", &[record(1, "Điều_1")]).expect("insert bllđ");

    let counts = records_per_source(&connection).expect("grouped counts");

    assert_eq!(
        counts,
        vec![("blds".to_string(), 2), ("bllđ".to_string(), 1)]
    );
}

#[test]
fn insert_records_stores_content_hash() {
    let mut connection = in_memory_db();
    let rows = vec![record(1, "Điều_1")];
    insert_records(&mut connection, "blds", &rows).expect("insert");

    let stored: String = connection
        .query_row(
            "SELECT content_sha256 FROM knowledge_base WHERE chunk_id = 'Điều_1'",
            [],
            |row| row.get(0),
        )
        .expect("row should exist");

    assert_eq!(stored, crate::util::sha256_text(&rows[0].content));
}

#[test]
fn drop_knowledge_base_reports_whether_a_table_existed() {
    let connection = in_memory_db();

    assert!(knowledge_base_exists(&connection).expect("inspect"));
    assert!(drop_knowledge_base(&connection).expect("first drop"));
    assert!(!knowledge_base_exists(&connection).expect("inspect"));
    assert!(!drop_knowledge_base(&connection).expect("second drop"));
}

#[test]
fn ingest_without_chunks_writes_manifest_and_leaves_database_untouched() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = write_source(
        temp.path(),
        "preamble.txt",
        "Some prose without any structure whatsoever,\nspread over two lines.\n",
    );
    let args = ingest_args(temp.path(), source, "empty_run.json");

    run(args.clone()).expect("ingest should succeed without chunks");

    let manifest = read_manifest(&args);
    assert_eq!(manifest["status"], "no_chunks");
    assert_eq!(manifest["source_label"], "preamble");
    assert_eq!(manifest["counts"]["records_inserted"], 0);
    assert_eq!(manifest["warnings"].as_array().map(Vec::len), Some(1));
    assert!(!default_db_path(temp.path()).exists());
}

#[test]
fn ingest_inserts_chunks_then_skips_them_on_rerun() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = write_source(
        temp.path(),
        "civil_code.txt",
        "Part One\nArticle 1. This code governs civil relations between persons.\n\
         Article 2. Every person has equal legal capacity under this code.\n",
    );

    let first = ingest_args(temp.path(), source.clone(), "first_run.json");
    run(first.clone()).expect("first ingest should succeed");
    let manifest = read_manifest(&first);
    assert_eq!(manifest["status"], "completed");
    assert_eq!(manifest["integrity_check"], "skipped");
    assert_eq!(manifest["counts"]["records_inserted"], 2);
    assert_eq!(manifest["counts"]["records_skipped_existing"], 0);
    assert_eq!(manifest["counts"]["records_total"], 2);

    let second = ingest_args(temp.path(), source, "second_run.json");
    run(second.clone()).expect("second ingest should succeed");
    let manifest = read_manifest(&second);
    assert_eq!(manifest["counts"]["records_inserted"], 0);
    assert_eq!(manifest["counts"]["records_skipped_existing"], 2);
    assert_eq!(manifest["counts"]["records_total"], 2);

    let connection =
        Connection::open(default_db_path(temp.path())).expect("database should exist");
    assert_eq!(
        records_per_source(&connection).expect("grouped counts"),
        vec![("civil_code".to_string(), 2)]
    );
}

#[test]
fn ingest_refuses_source_with_unexpected_hash() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = write_source(
        temp.path(),
        "civil_code.txt",
        "Article 1. This code governs civil relations between persons.\n",
    );
    let mut args = ingest_args(temp.path(), source, "refused_run.json");
    args.expected_sha256 = Some("00".repeat(32));

    let err = run(args.clone()).expect_err("hash mismatch must abort the import");

    assert!(err.to_string().contains("refusing to import"));
    assert!(!default_db_path(temp.path()).exists());
    assert!(!args.ingest_manifest_path.as_ref().expect("path is set").exists());
}
