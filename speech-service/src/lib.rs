//! Speech capture and transcription.
//!
//! [`SpeechService`] records a fixed window of microphone audio through an
//! [`AudioRecorder`], wraps it in an in-memory WAV container and hands it to
//! a [`Transcriber`]. The real backends (`cpal` and `whisper-rs`) live in
//! [`native`] behind the `native` feature.

pub mod config;
pub mod error_handler;
pub mod recorder;
pub mod resample;
pub mod speech_service;
pub mod transcriber;
pub mod wav;

#[cfg(feature = "native")]
pub mod native;

pub use config::{CaptureSpec, SpeechConfig};
pub use error_handler::{Result, SpeechError};
pub use recorder::AudioRecorder;
pub use speech_service::{SpeechService, join_segments};
pub use transcriber::Transcriber;
