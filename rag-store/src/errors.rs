//! Unified error types for the crate.

use std::path::PathBuf;

use ai_llm_service::AiLlmError;
use reqwest::StatusCode;
use services::{ConfigError, ErrorClass};
use thiserror::Error;

/// Top-level error for rag-store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Chroma could not be reached.
    #[error(
        "unable to connect to Chroma at {base}. Start Chroma (for example: `docker run -p 8000:8000 chromadb/chroma`) or set the LOCALCHAT_CHROMA_URL environment variable to the correct endpoint"
    )]
    Connection {
        base: String,
        #[source]
        source: reqwest::Error,
    },

    /// The PDF path does not exist.
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The PDF could not be parsed.
    #[error("failed to extract text from PDF: {0}")]
    Extraction(String),

    /// Extraction succeeded but produced no usable chunk.
    #[error("no readable text found in {}", .0.display())]
    NoContent(PathBuf),

    /// Chroma answered with a non-successful status.
    #[error("Chroma returned HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Chroma answered 2xx with an unexpected body.
    #[error("unexpected Chroma response: {0}")]
    Decode(String),

    /// The embedding backend failed or returned an empty vector.
    #[error("embedding failed: {0}")]
    Embedding(#[source] AiLlmError),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the ingestion.
    #[error("ingestion cancelled")]
    Cancelled,
}

impl From<ConfigError> for RagError {
    fn from(e: ConfigError) -> Self {
        RagError::Config(e.to_string())
    }
}

impl RagError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RagError::Config(_) => ErrorClass::Config,
            RagError::Connection { .. } => ErrorClass::Connection,
            RagError::NotFound(_) => ErrorClass::NotFound,
            RagError::NoContent(_) => ErrorClass::NoContent,
            RagError::HttpStatus { .. } => ErrorClass::Remote,
            RagError::Embedding(inner) => inner.class(),
            RagError::Cancelled => ErrorClass::Cancelled,
            RagError::Extraction(_) | RagError::Decode(_) | RagError::Io(_) => ErrorClass::Other,
        }
    }
}
