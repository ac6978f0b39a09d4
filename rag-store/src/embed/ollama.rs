//! Ollama embedding provider implementation.
//!
//! Adapts [`OllamaService::embeddings`] to [`EmbeddingsProvider`].

use std::future::Future;
use std::pin::Pin;

use ai_llm_service::{AiLlmError, OllamaService};
use services::CancellationToken;

use crate::{EmbeddingsProvider, RagError};

/// Ollama embedding provider (async).
#[derive(Clone, Debug)]
pub struct OllamaEmbedder {
    svc: OllamaService,
}

impl OllamaEmbedder {
    /// `svc` must be configured with an embedding model.
    pub fn new(svc: OllamaService) -> Self {
        Self { svc }
    }

    pub fn model(&self) -> &str {
        &self.svc.config().model
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            self.svc
                .embeddings(text, cancel)
                .await
                .map_err(|e| match e {
                    AiLlmError::Cancelled => RagError::Cancelled,
                    other => RagError::Embedding(other),
                })
        })
    }
}
