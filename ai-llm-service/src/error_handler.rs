//! Unified error handling for `ai-llm-service`.
//!
//! A single top-level error type [`AiLlmError`] covers configuration,
//! transport, upstream status and decoding failures. [`AiLlmError::class`]
//! maps every variant onto the shared [`ErrorClass`] taxonomy.

use reqwest::StatusCode;
use services::{ConfigError, ErrorClass};
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server could not be reached at all.
    #[error(
        "could not reach Ollama at {endpoint}. Start it with `ollama serve`, then verify with: curl {endpoint}/api/tags"
    )]
    Connection {
        /// Base URL that was tried.
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream returned a non-successful HTTP status.
    #[error("unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Transport failure after the response started (body read, stream).
    #[error("transport error while reading response: {0}")]
    Transport(#[source] reqwest::Error),

    /// Unexpected/invalid JSON response.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The embedding endpoint answered with an empty vector.
    #[error("embedding model `{model}` returned an empty vector")]
    EmptyEmbedding {
        /// Embedding model name.
        model: String,
    },

    /// The operation was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

impl AiLlmError {
    /// Coarse category for user-facing handling.
    pub fn class(&self) -> ErrorClass {
        match self {
            AiLlmError::Config(_) => ErrorClass::Config,
            AiLlmError::Connection { .. } | AiLlmError::Transport(_) => ErrorClass::Connection,
            AiLlmError::HttpStatus { .. } => ErrorClass::Remote,
            AiLlmError::EmptyEmbedding { .. } => ErrorClass::EmptyResult,
            AiLlmError::Cancelled => ErrorClass::Cancelled,
            AiLlmError::Decode(_) => ErrorClass::Other,
        }
    }
}
