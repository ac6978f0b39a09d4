//! End-to-end ingestion pipeline: check Chroma → read PDF → chunk → resolve
//! collection → embed → add.
//!
//! Steps run strictly in order and the first error aborts the run. Nothing is
//! written to Chroma before the final `add`, except a collection that had to
//! be created.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use services::ids::chunk_id;
use services::{CancellationToken, cancellable};
use tracing::{debug, info, instrument};

use crate::chroma_facade::{AddRecords, ChromaFacade};
use crate::chunk::chunk_document;
use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::extract::TextExtractor;
use crate::record::IngestionResult;

/// Ingests one PDF into the configured collection.
#[instrument(skip_all, fields(path = %path.display(), collection = %cfg.collection))]
pub async fn ingest_pdf(
    cfg: &RagConfig,
    chroma: &ChromaFacade,
    extractor: Arc<dyn TextExtractor>,
    provider: &dyn EmbeddingsProvider,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<IngestionResult, RagError> {
    guarded(cancel, chroma.heartbeat()).await?;

    if !path.is_file() {
        return Err(RagError::NotFound(path.to_path_buf()));
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let text = {
        let owned = path.to_path_buf();
        let job = tokio::task::spawn_blocking(move || extractor.extract(&owned));
        cancellable(cancel, job)
            .await
            .ok_or(RagError::Cancelled)?
            .map_err(|e| RagError::Extraction(format!("extraction task failed: {e}")))??
    };

    let chunks = chunk_document(&text, &file_name, cfg.chunk_size, cfg.chunk_overlap);
    if chunks.is_empty() {
        return Err(RagError::NoContent(path.to_path_buf()));
    }
    info!(chunks = chunks.len(), chars = text.chars().count(), "document chunked");

    let collection_id = guarded(cancel, chroma.resolve_collection(&cfg.collection)).await?;

    let pb = progress_bar(cfg.show_progress, chunks.len());
    let mut batch = AddRecords::default();
    for chunk in &chunks {
        let vector = provider.embed(&chunk.text, cancel).await?;
        debug!(index = chunk.index, dim = vector.len(), "chunk embedded");

        batch.ids.push(chunk_id(&stem, chunk.index));
        batch.documents.push(chunk.text.clone());
        batch.embeddings.push(vector);
        batch.metadatas.push(json!({
            "source": chunk.source_file,
            "chunk_index": chunk.index,
        }));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let stored = guarded(cancel, chroma.add(&collection_id, &batch)).await?;
    info!(stored, "ingestion complete");

    Ok(IngestionResult {
        file_name,
        collection_name: cfg.collection.clone(),
        chunks_stored: stored,
    })
}

/// Runs a Chroma call unless `cancel` fires first.
async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, RagError>>,
) -> Result<T, RagError> {
    cancellable(cancel, fut).await.ok_or(RagError::Cancelled)?
}

fn progress_bar(enabled: bool, len: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] embedding [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
