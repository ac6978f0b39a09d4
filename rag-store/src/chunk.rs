//! Fixed-size overlapping text windows.

use crate::record::TextChunk;

/// Splits `text` into windows of `size` characters that advance by
/// `size - overlap`.
///
/// Line breaks (`\r`, `\n`) are replaced by spaces first. Every window is
/// trimmed and dropped if nothing is left; the last window always ends at the
/// end of the text. Lengths count Unicode scalar values, not bytes.
///
/// ```
/// use rag_store::chunk_text;
///
/// let text = "a".repeat(1000);
/// let chunks = chunk_text(&text, 900, 150);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[1].len(), 250);
/// ```
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);
    let chars: Vec<char> = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();

    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

/// [`chunk_text`] with provenance attached.
pub fn chunk_document(text: &str, source_file: &str, size: usize, overlap: usize) -> Vec<TextChunk> {
    chunk_text(text, size, overlap)
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk {
            text,
            source_file: source_file.to_string(),
            index,
        })
        .collect()
}
