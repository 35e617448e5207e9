use anyhow::Result;
use tracing::{debug, info, warn};

use crate::chunking::ChunkPipeline;
use crate::cli::ChunkArgs;
use crate::commands::records::build_chunk_records;
use crate::util::{char_preview, read_source_text, write_json_pretty};

pub fn run(args: ChunkArgs) -> Result<()> {
    let config = args.chunker.resolve()?;
    let pipeline = ChunkPipeline::new(config)?;

    let raw_text = read_source_text(&args.source)?;
    info!(
        source = %args.source.display(),
        raw_chars = raw_text.chars().count(),
        language = args.chunker.language.as_str(),
        "chunking source"
    );

    if raw_text.trim().is_empty() {
        warn!(source = %args.source.display(), "source text is empty; check the extraction step");
    }

    let report = pipeline.process_with_report(&raw_text);
    info!(
        normalized_chars = report.normalized_char_count,
        preview = %char_preview(&report.normalized_text, args.preview_chars),
        "normalized text"
    );

    for verdict in report
        .verdicts
        .iter()
        .filter(|verdict| !verdict.decision.is_accepted())
    {
        debug!(
            number = verdict.number,
            decision = ?verdict.decision,
            "rejected article header"
        );
    }

    let records = build_chunk_records(&report.chunks, &pipeline.config().vocabulary.article_keyword);
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => {
            info!(
                chunk_id = %first.chunk_id,
                preview = %char_preview(&first.content, args.preview_chars),
                "first chunk"
            );
            info!(
                chunk_id = %last.chunk_id,
                preview = %char_preview(&last.content, args.preview_chars),
                "last chunk"
            );
        }
        _ => warn!("no articles found; check the header vocabulary or the extracted text"),
    }

    info!(
        chunks = records.len(),
        candidates = report.candidate_count,
        accepted_gaps = report.accepted_gap_count,
        distant_refs = report.distant_reference_count,
        "chunking completed"
    );

    if let Some(output) = &args.output {
        write_json_pretty(output, &records)?;
        info!(path = %output.display(), "wrote chunk records");
    }

    Ok(())
}
