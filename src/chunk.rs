//! Paragraph-first text chunker.
//!
//! Splits a document's text into pieces of at most `max_chars` characters.
//! Boundaries are preferred strictly in the order paragraph (`\n\n`) >
//! line (`\n`) > character: small paragraphs are packed together, a
//! paragraph that is too long on its own is split into line groups, and a
//! single line that is still too long is hard-cut on `char` boundaries.
//!
//! Only whitespace at the cut points is dropped, so concatenating the
//! pieces reproduces the non-whitespace content of the input.

/// Split `text` into chunk bodies no longer than `max_chars` characters.
///
/// Returns an empty vector for empty or whitespace-only text.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current_buf = String::new();
    let mut current_len = 0usize;

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }
        let para_len = char_len(trimmed);

        if para_len > max_chars {
            flush(&mut chunks, &mut current_buf, &mut current_len);
            chunks.extend(split_paragraph(trimmed, max_chars));
            continue;
        }

        // +2 for the \n\n separator
        let would_be = if current_buf.is_empty() {
            para_len
        } else {
            current_len + 2 + para_len
        };

        if would_be > max_chars {
            flush(&mut chunks, &mut current_buf, &mut current_len);
        }

        if !current_buf.is_empty() {
            current_buf.push_str("\n\n");
            current_len += 2;
        }
        current_buf.push_str(trimmed);
        current_len += para_len;
    }

    flush(&mut chunks, &mut current_buf, &mut current_len);
    chunks
}

fn flush(chunks: &mut Vec<String>, buf: &mut String, len: &mut usize) {
    if !buf.is_empty() {
        chunks.push(std::mem::take(buf));
        *len = 0;
    }
}

/// Split an oversized paragraph into groups of whole lines.
fn split_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();
    let mut len = 0usize;

    for line in paragraph.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let line_len = char_len(line);

        if line_len > max_chars {
            flush(&mut pieces, &mut buf, &mut len);
            pieces.extend(hard_split(line.trim(), max_chars));
            continue;
        }

        let would_be = if buf.is_empty() {
            line_len
        } else {
            len + 1 + line_len
        };
        if would_be > max_chars {
            flush(&mut pieces, &mut buf, &mut len);
        }

        if !buf.is_empty() {
            buf.push('\n');
            len += 1;
        }
        buf.push_str(line);
        len += line_len;
    }

    flush(&mut pieces, &mut buf, &mut len);
    pieces
}

/// Cut a single line at `max_chars` character boundaries.
fn hard_split(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect::<String>())
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
