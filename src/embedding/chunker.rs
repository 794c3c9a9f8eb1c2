//! Overlapping text chunking with boundary-aware splitting.

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Each split point prefers, in order, the last sentence end (`.`), the last
/// paragraph break (`\n\n`), then the last space past the chunk midpoint, so
/// chunks end on natural boundaries where possible. Consecutive chunks share
/// `overlap` characters of context. Text at or under `chunk_size` comes back
/// as a single chunk.
#[must_use]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text.len()));
        if end < text.len() {
            let midpoint = start + chunk_size / 2;
            if let Some(boundary) = find_break(&text[start..end], midpoint - start) {
                end = start + boundary;
            }
        }
        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end >= text.len() {
            break;
        }
        let next = floor_char_boundary(text, end.saturating_sub(overlap).max(start));
        // Overlap must never stall the cursor.
        start = if next > start { next } else { end };
    }
    chunks
}

/// Offset just past the best break found after `midpoint`, or `None` when
/// the window has no usable boundary.
fn find_break(window: &str, midpoint: usize) -> Option<usize> {
    for pattern in [".", "\n\n", " "] {
        if let Some(pos) = window.rfind(pattern)
            && pos > midpoint
        {
            return Some(pos + pattern.len());
        }
    }
    None
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
