use std::path::PathBuf;

use services::{ConfigError, ErrorClass};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeechError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("whisper model not found at {}. Download a ggml model or set WHISPER_MODEL_PATH", .0.display())]
    ModelNotFound(PathBuf),

    #[error("no audio input device available")]
    NoInputDevice,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("recording cancelled")]
    Cancelled,
}

impl SpeechError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SpeechError::Config(_) => ErrorClass::Config,
            SpeechError::ModelNotFound(_) => ErrorClass::NotFound,
            SpeechError::Cancelled => ErrorClass::Cancelled,
            SpeechError::NoInputDevice
            | SpeechError::Device(_)
            | SpeechError::Wav(_)
            | SpeechError::Transcription(_) => ErrorClass::Other,
        }
    }
}
