//! Runtime and collection configuration.

use services::EnvReader;

use crate::errors::RagError;

pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
pub const DEFAULT_COLLECTION: &str = "localchat_rag";
pub const DEFAULT_CHUNK_SIZE: usize = 900;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Configuration for PDF ingestion.
#[derive(Clone, Debug, PartialEq)]
pub struct RagConfig {
    /// Chroma HTTP endpoint, e.g. `http://localhost:8000`.
    pub chroma_url: String,
    /// Target collection name.
    pub collection: String,
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows; must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
    /// Draw an `indicatif` bar while embedding.
    pub show_progress: bool,
    /// Optional timeout for Chroma requests (seconds).
    pub timeout_secs: Option<u64>,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Chroma endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            chroma_url: url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            show_progress: false,
            timeout_secs: None,
        }
    }

    /// Reads `LOCALCHAT_CHROMA_URL`, `RAG_COLLECTION`, `RAG_CHUNK_SIZE`,
    /// `RAG_CHUNK_OVERLAP` and `CHROMA_TIMEOUT_SECS`.
    pub fn from_env_reader(env: &EnvReader<'_>) -> Result<Self, RagError> {
        let cfg = Self {
            chroma_url: env.http_url_or("LOCALCHAT_CHROMA_URL", DEFAULT_CHROMA_URL)?,
            collection: env.string_or("RAG_COLLECTION", DEFAULT_COLLECTION),
            chunk_size: env.opt_usize("RAG_CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: env
                .opt_usize("RAG_CHUNK_OVERLAP")?
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            show_progress: false,
            timeout_secs: env.opt_u64("CHROMA_TIMEOUT_SECS")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if !(self.chroma_url.starts_with("http://") || self.chroma_url.starts_with("https://")) {
            return Err(RagError::Config(
                "chroma_url must start with http:// or https://".into(),
            ));
        }
        if !is_valid_collection_name(&self.collection) {
            return Err(RagError::Config(format!(
                "invalid collection name `{}`: use 3-63 characters from [A-Za-z0-9._-], \
                 starting and ending with a letter or digit",
                self.collection
            )));
        }
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Chroma's naming rule; the name also ends up in request paths.
fn is_valid_collection_name(name: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    (3..=63).contains(&name.len())
        && name.chars().all(allowed)
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvReader<'static> {
        EnvReader::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults() {
        let cfg = RagConfig::from_env_reader(&env(&[])).unwrap();
        assert_eq!(
            cfg,
            RagConfig::new_default("http://localhost:8000", "localchat_rag")
        );
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let e = env(&[("RAG_CHUNK_SIZE", "100"), ("RAG_CHUNK_OVERLAP", "100")]);
        assert!(matches!(
            RagConfig::from_env_reader(&e),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn chroma_url_is_validated() {
        let e = env(&[("LOCALCHAT_CHROMA_URL", "chroma:8000")]);
        assert!(RagConfig::from_env_reader(&e).is_err());
    }

    #[test]
    fn collection_names_follow_chroma_rules() {
        let longest = "a".repeat(63);
        let too_long = "a".repeat(64);
        for ok in ["localchat_rag", "abc", "docs.v2-en", longest.as_str()] {
            assert!(is_valid_collection_name(ok), "{ok}");
        }
        for bad in ["", "ab", "a/b/c", "rag?x=1", "my rag", "_rag", "rag-", too_long.as_str()] {
            assert!(!is_valid_collection_name(bad), "{bad}");
        }
    }

    #[test]
    fn path_like_collection_names_are_rejected() {
        let e = env(&[("RAG_COLLECTION", "docs/../admin")]);
        assert!(matches!(
            RagConfig::from_env_reader(&e),
            Err(RagError::Config(_))
        ));
    }
}
