use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{SourceEntry, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let source_root = args
        .source_root
        .clone()
        .unwrap_or_else(|| default_source_root(&args.cache_root));
    let manifest = build_manifest(&source_root)?;

    if args.dry_run {
        info!(
            source_count = manifest.source_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    for source in &manifest.sources {
        info!(
            filename = %source.filename,
            bytes = source.byte_len,
            sha256 = %source.sha256,
            "recorded source hash"
        );
    }
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(())
}

pub fn default_source_root(cache_root: &Path) -> PathBuf {
    cache_root.join("raw")
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("source_inventory.json")
}

pub fn build_manifest(source_root: &Path) -> Result<SourceInventoryManifest> {
    let mut source_paths = discover_text_sources(source_root)?;
    source_paths.sort();

    if source_paths.is_empty() {
        bail!("no .txt sources found in {}", source_root.display());
    }

    let mut sources = Vec::with_capacity(source_paths.len());
    for path in source_paths {
        sources.push(describe_source(&path)?);
    }

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_root.display().to_string(),
        source_count: sources.len(),
        sources,
    })
}

pub fn describe_source(path: &Path) -> Result<SourceEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
    let byte_len = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    let sha256 = sha256_file(path)?;

    Ok(SourceEntry {
        filename,
        byte_len,
        sha256,
    })
}

/// Loads a previously written inventory, if there is one.
pub fn load_manifest(manifest_path: &Path) -> Result<Option<SourceInventoryManifest>> {
    if !manifest_path.exists() {
        return Ok(None);
    }

    let raw = fs::read(manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: SourceInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
    Ok(Some(manifest))
}

fn discover_text_sources(source_root: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    let entries = fs::read_dir(source_root)
        .with_context(|| format!("failed to read {}", source_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text {
            sources.push(path);
        }
    }

    Ok(sources)
}
