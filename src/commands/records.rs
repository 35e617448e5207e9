use crate::model::ChunkRecord;

const MAX_CHUNK_ID_CHARS: usize = 20;

pub fn build_chunk_records(chunks: &[String], article_keyword: &str) -> Vec<ChunkRecord> {
    chunks
        .iter()
        .enumerate()
        .map(|(index, content)| {
            let seq = index + 1;
            ChunkRecord {
                seq,
                chunk_id: derive_chunk_id(content, seq, article_keyword),
                content: content.clone(),
            }
        })
        .collect()
}

/// `Điều_12` from a chunk whose first article line reads `Điều 12. ...`.
/// Falls back to `Article_<seq>` when no such line exists or the heading was
/// cut so badly that the derived id runs long.
pub fn derive_chunk_id(content: &str, seq: usize, article_keyword: &str) -> String {
    let keyword = article_keyword.trim().to_lowercase();
    let heading = content
        .lines()
        .map(str::trim)
        .find(|line| !keyword.is_empty() && line.to_lowercase().starts_with(&keyword));

    let derived = heading
        .and_then(|line| line.split('.').next())
        .map(|head| head.trim().replace(' ', "_"))
        .filter(|id| !id.is_empty() && id.chars().count() <= MAX_CHUNK_ID_CHARS);

    derived.unwrap_or_else(|| format!("Article_{seq}"))
}
