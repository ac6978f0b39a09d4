//! Core data models used by the library.

use serde::Serialize;

/// One window of document text, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    /// File name (not the full path) of the source document.
    pub source_file: String,
    /// Zero-based position within the document.
    pub index: usize,
}

/// Summary of one successful ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestionResult {
    pub file_name: String,
    pub collection_name: String,
    pub chunks_stored: usize,
}
