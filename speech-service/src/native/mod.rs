//! Hardware-backed implementations (feature `native`).

mod microphone;
mod whisper;

pub use microphone::MicrophoneRecorder;
pub use whisper::WhisperTranscriber;
