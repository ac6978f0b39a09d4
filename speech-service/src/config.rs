//! Capture format and model location.
//!
//! # Environment variables
//!
//! - `WHISPER_MODEL_PATH`  = ggml model file (default `models/ggml-base.bin`)
//! - `WHISPER_LANGUAGE`    = transcription language (default `en`)
//! - `SPEECH_CAPTURE_SECS` = recording window in seconds (default 6)

use std::path::PathBuf;
use std::time::Duration;

use services::{ConfigError, EnvReader};

pub const DEFAULT_MODEL_PATH: &str = "models/ggml-base.bin";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_CAPTURE_SECS: u64 = 6;

/// PCM format requested from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// How long to record before stopping on our own.
    pub duration: Duration,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            duration: Duration::from_secs(DEFAULT_CAPTURE_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    pub model_path: PathBuf,
    pub language: String,
    pub capture: CaptureSpec,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            language: DEFAULT_LANGUAGE.to_string(),
            capture: CaptureSpec::default(),
        }
    }
}

impl SpeechConfig {
    /// # Errors
    /// [`ConfigError`] if `SPEECH_CAPTURE_SECS` is not a positive integer.
    pub fn from_env_reader(env: &EnvReader<'_>) -> Result<Self, ConfigError> {
        let secs = env
            .opt_u64("SPEECH_CAPTURE_SECS")?
            .unwrap_or(DEFAULT_CAPTURE_SECS);
        if secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "SPEECH_CAPTURE_SECS",
                detail: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            model_path: env
                .get("WHISPER_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            language: env.string_or("WHISPER_LANGUAGE", DEFAULT_LANGUAGE),
            capture: CaptureSpec {
                duration: Duration::from_secs(secs),
                ..CaptureSpec::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_16k_mono_six_seconds() {
        let cfg = SpeechConfig::from_env_reader(&EnvReader::from_map(Default::default())).unwrap();
        assert_eq!(cfg.capture.sample_rate, 16_000);
        assert_eq!(cfg.capture.channels, 1);
        assert_eq!(cfg.capture.duration, Duration::from_secs(6));
        assert_eq!(cfg.model_path, PathBuf::from("models/ggml-base.bin"));
        assert_eq!(cfg.language, "en");
    }

    #[test]
    fn zero_seconds_is_rejected() {
        let env = EnvReader::new(|k| (k == "SPEECH_CAPTURE_SECS").then(|| "0".to_string()));
        assert!(SpeechConfig::from_env_reader(&env).is_err());
    }
}
