use std::path::Path;

use crate::error_handler::Result;

/// Speech-to-text engine.
///
/// Implementations are blocking and CPU-bound; [`SpeechService`](crate::SpeechService)
/// calls them from `spawn_blocking`.
pub trait Transcriber: Send + Sync {
    /// Transcribes a complete WAV file and returns its text segments in order.
    fn transcribe(&self, model_path: &Path, wav: &[u8], language: &str) -> Result<Vec<String>>;
}
