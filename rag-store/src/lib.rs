//! High-level RAG facade: PDF ingestion into Chroma.
//!
//! This crate provides a clean API to:
//! - Extract text from a PDF and cut it into overlapping windows
//! - Embed every window through a pluggable [`EmbeddingsProvider`]
//! - Store windows, vectors and metadata in a Chroma collection
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod chroma_facade;
mod chunk;
mod config;
mod embed;
mod errors;
mod extract;
mod ingest;
mod record;

pub use chroma_facade::{AddRecords, ChromaFacade};
pub use chunk::{chunk_document, chunk_text};
pub use config::RagConfig;
pub use embed::EmbeddingsProvider;
pub use embed::ollama::OllamaEmbedder;
pub use errors::RagError;
pub use extract::{PdfExtractor, TextExtractor};
pub use record::{IngestionResult, TextChunk};

use std::path::Path;
use std::sync::Arc;

use services::CancellationToken;
use tracing::trace;

/// High-level facade that wires configuration, Chroma, extraction and embeddings.
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    cfg: RagConfig,
    chroma: ChromaFacade,
    extractor: Arc<dyn TextExtractor>,
    provider: Arc<dyn EmbeddingsProvider>,
}

impl std::fmt::Debug for RagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagStore")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl RagStore {
    /// Constructs a store that extracts text with [`PdfExtractor`].
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration is invalid.
    pub fn new(
        client: reqwest::Client,
        cfg: RagConfig,
        provider: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let chroma = ChromaFacade::new(client, &cfg)?;
        Ok(Self {
            cfg,
            chroma,
            extractor: Arc::new(PdfExtractor),
            provider,
        })
    }

    /// Replaces the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn chroma(&self) -> &ChromaFacade {
        &self.chroma
    }

    /// Ingests one PDF file.
    ///
    /// # Errors
    /// Returns connection, extraction, embedding or Chroma failures; see [`RagError`].
    pub async fn ingest_pdf(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<IngestionResult, RagError> {
        ingest::ingest_pdf(
            &self.cfg,
            &self.chroma,
            Arc::clone(&self.extractor),
            self.provider.as_ref(),
            path.as_ref(),
            cancel,
        )
        .await
    }
}
