//! Identifiers for records written to the vector store.

use uuid::Uuid;

/// Fixed length of every chunk id.
pub const CHUNK_ID_LEN: usize = 24;

/// Minimum number of random hex characters kept in a chunk id.
const MIN_SUFFIX: usize = 8;

/// Builds `{stem}-{index}-{random}` truncated to [`CHUNK_ID_LEN`] characters.
///
/// The stem is shortened first, so the index and at least eight random hex
/// characters always survive truncation; two ids from the same file never
/// collapse into the same prefix.
pub fn chunk_id(stem: &str, index: usize) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let index = index.to_string();

    // room for "{stem}-" after "{index}-{suffix}"
    let fixed = index.len() + 1 + MIN_SUFFIX;
    let stem_room = CHUNK_ID_LEN.saturating_sub(fixed + 1);
    let stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .take(stem_room)
        .collect();

    let head = if stem.is_empty() {
        format!("{index}-")
    } else {
        format!("{stem}-{index}-")
    };
    let mut id = head;
    id.push_str(&random);
    id.chars().take(CHUNK_ID_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_fixed_length_and_keep_the_index() {
        let id = chunk_id("report", 3);
        assert_eq!(id.len(), CHUNK_ID_LEN);
        assert!(id.starts_with("report-3-"));
    }

    #[test]
    fn long_stems_do_not_swallow_index_or_suffix() {
        let stem = "a-very-long-file-name-that-exceeds-everything";
        let a = chunk_id(stem, 41);
        let b = chunk_id(stem, 42);
        assert_eq!(a.len(), CHUNK_ID_LEN);
        assert!(a.contains("-41-"));
        assert!(b.contains("-42-"));
        let suffix = a.rsplit('-').next().unwrap();
        assert!(suffix.len() >= MIN_SUFFIX);
    }

    #[test]
    fn non_ascii_stems_are_filtered() {
        let id = chunk_id("отчёт 2024", 0);
        assert!(id.is_ascii());
        assert!(id.starts_with("2024-0-"));
    }
}
