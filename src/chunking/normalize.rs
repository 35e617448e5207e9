use unicode_normalization::UnicodeNormalization;

use super::headers::HeaderPatterns;

/// Rejoins wrapped prose into continuous lines, keeping a line break only
/// where the next line opens with a structural header.
pub fn normalize_text(raw: &str, patterns: &HeaderPatterns) -> String {
    let composed = raw.nfc().collect::<String>();
    let mut output = String::with_capacity(composed.len());

    for raw_line in composed.split(['\n', '\r']) {
        let line = collapse_whitespace(raw_line);
        if line.is_empty() {
            continue;
        }

        if !output.is_empty() {
            if patterns.starts_with_header(&line) {
                output.push('\n');
            } else {
                output.push(' ');
            }
        }
        output.push_str(&line);
    }

    output
}

/// Breaks lines again before header keywords that ended up mid-line, for
/// extractions that lost their line structure entirely.
pub fn split_inline_headers(text: &str, patterns: &HeaderPatterns) -> String {
    let mut output = String::with_capacity(text.len() + text.len() / 16);

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let mut cursor = 0usize;
        for offset in patterns.inline_header_offsets(line) {
            let head = line.get(cursor..offset).unwrap_or_default().trim_end();
            output.push_str(head);
            output.push('\n');
            cursor = offset;
        }
        output.push_str(line.get(cursor..).unwrap_or_default());
    }

    output
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<&str>>().join(" ")
}
