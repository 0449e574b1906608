//! Document chunking for policy indexing.

/// Split a document into chunks of roughly `chunk_size` characters with
/// `overlap` characters carried between consecutive chunks.
///
/// Chunk boundaries prefer the nearest newline or sentence end inside the
/// window, so criteria sentences are not cut mid-clause.
pub fn chunk_document(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    if chunk_size == 0 {
        return chunks;
    }

    let len = text.len();
    let mut start = 0usize;

    while start < len {
        let mut end = (start + chunk_size).min(len);
        while end < len && !text.is_char_boundary(end) {
            end += 1;
        }

        if end < len {
            let window = &text[start..end];
            let last_break = window.rfind('\n').max(window.rfind(". ").map(|i| i + 1));
            // Only honor a break point past the middle of the window;
            // earlier breaks would produce degenerate chunks.
            if let Some(rel) = last_break {
                if rel > chunk_size / 2 {
                    end = start + rel + 1;
                }
            }
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= len {
            break;
        }
        let mut next = end.saturating_sub(overlap).max(start + 1);
        while next < len && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}
