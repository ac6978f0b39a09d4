//! Document text extraction.

use std::path::Path;

use tracing::debug;

use crate::errors::RagError;

/// Turns a document file into plain text.
///
/// Blocking; the pipeline calls it from `spawn_blocking`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, RagError>;
}

/// PDF text via `pdf-extract`, pages concatenated in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, RagError> {
        let bytes = std::fs::read(path)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| RagError::Extraction(e.to_string()))?;
        debug!(bytes = bytes.len(), chars = text.chars().count(), "pdf text extracted");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_fail_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(
            PdfExtractor.extract(&path),
            Err(RagError::Extraction(_))
        ));
    }
}
