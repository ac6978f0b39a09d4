use std::future::Future;
use std::pin::Pin;

use services::CancellationToken;

use crate::errors::RagError;

/// Trait for embedding providers (async).
///
/// This is the abstraction the ingestion pipeline embeds chunks through.
pub trait EmbeddingsProvider: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(
        &'a self,
        text: &'a str,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod ollama;
