//! Capture → WAV → transcription pipeline.

use std::sync::Arc;
use std::time::Instant;

use services::{CancellationToken, cancellable};
use tracing::{debug, info, instrument};

use crate::config::SpeechConfig;
use crate::error_handler::{Result, SpeechError};
use crate::recorder::AudioRecorder;
use crate::transcriber::Transcriber;
use crate::wav::encode_wav;

/// Records one utterance and turns it into text.
#[derive(Clone)]
pub struct SpeechService {
    cfg: SpeechConfig,
    recorder: Arc<dyn AudioRecorder>,
    transcriber: Arc<dyn Transcriber>,
}

impl std::fmt::Debug for SpeechService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechService")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl SpeechService {
    pub fn new(
        cfg: SpeechConfig,
        recorder: Arc<dyn AudioRecorder>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            cfg,
            recorder,
            transcriber,
        }
    }

    /// Service wired to the default microphone and whisper.cpp.
    #[cfg(feature = "native")]
    pub fn native(cfg: SpeechConfig) -> Self {
        Self::new(
            cfg,
            Arc::new(crate::native::MicrophoneRecorder),
            Arc::new(crate::native::WhisperTranscriber),
        )
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.cfg
    }

    /// Records `capture.duration` of audio and returns the transcription.
    ///
    /// The model file is checked before the microphone is opened. Segments
    /// are trimmed, blanks dropped and the rest joined with single spaces, so
    /// silence yields an empty string.
    ///
    /// # Errors
    /// - [`SpeechError::ModelNotFound`] if the model file does not exist
    /// - [`SpeechError::Cancelled`] if `cancel` fires at any point
    /// - device, WAV and transcription failures from the backends
    #[instrument(skip_all, fields(model = %self.cfg.model_path.display(), language = %self.cfg.language))]
    pub async fn capture_and_transcribe(&self, cancel: &CancellationToken) -> Result<String> {
        if !self.cfg.model_path.is_file() {
            return Err(SpeechError::ModelNotFound(self.cfg.model_path.clone()));
        }
        if cancel.is_cancelled() {
            return Err(SpeechError::Cancelled);
        }

        let spec = self.cfg.capture;
        let started = Instant::now();
        let samples = self.recorder.record(&spec, cancel).await?;
        debug!(
            samples = samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capture finished"
        );

        let wav = encode_wav(&samples, &spec)?;

        let transcriber = Arc::clone(&self.transcriber);
        let model_path = self.cfg.model_path.clone();
        let language = self.cfg.language.clone();
        let job = tokio::task::spawn_blocking(move || {
            transcriber.transcribe(&model_path, &wav, &language)
        });

        let segments = cancellable(cancel, job)
            .await
            .ok_or(SpeechError::Cancelled)?
            .map_err(|e| SpeechError::Transcription(format!("transcription task failed: {e}")))??;

        let text = join_segments(&segments);
        info!(
            segments = segments.len(),
            chars = text.chars().count(),
            "transcription finished"
        );
        Ok(text)
    }
}

/// Trims every segment, drops blank ones and joins the rest with one space.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_trimmed_and_joined() {
        assert_eq!(
            join_segments(&[" Hello", "", "  world.  ", "\n"]),
            "Hello world."
        );
        assert_eq!(join_segments::<&str>(&[]), "");
        assert_eq!(join_segments(&["   "]), "");
    }
}
