//! Image-generation settings.
//!
//! # Environment variables
//!
//! - `SD_URL`           = server base URL (default `http://127.0.0.1:7860`)
//! - `SD_STEPS`         = sampling steps (default 28)
//! - `SD_WIDTH`         = image width (default 768)
//! - `SD_HEIGHT`        = image height (default 768)
//! - `SD_CFG_SCALE`     = classifier-free guidance scale (default 7)
//! - `IMAGE_OUTPUT_DIR` = where PNG files are written (default `generated-images`)

use std::path::PathBuf;

use services::{ConfigError, EnvReader};

pub const DEFAULT_SD_URL: &str = "http://127.0.0.1:7860";
pub const DEFAULT_OUTPUT_DIR: &str = "generated-images";

/// Parameters for txt2img calls and the output location.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenConfig {
    /// Server base URL without trailing slash.
    pub base_url: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f32,
    /// Directory receiving generated files; created on demand.
    pub output_dir: PathBuf,
    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SD_URL.to_string(),
            steps: 28,
            width: 768,
            height: 768,
            cfg_scale: 7.0,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout_secs: None,
        }
    }
}

impl ImageGenConfig {
    /// Builds the config from environment-like key/value source.
    ///
    /// # Errors
    /// [`ConfigError`] for a malformed URL or number, or a zero dimension.
    pub fn from_env_reader(env: &EnvReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let cfg = Self {
            base_url: env.http_url_or("SD_URL", DEFAULT_SD_URL)?,
            steps: env.opt_u32("SD_STEPS")?.unwrap_or(d.steps),
            width: env.opt_u32("SD_WIDTH")?.unwrap_or(d.width),
            height: env.opt_u32("SD_HEIGHT")?.unwrap_or(d.height),
            cfg_scale: env.opt_f32("SD_CFG_SCALE")?.unwrap_or(d.cfg_scale),
            output_dir: env
                .get("IMAGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.output_dir),
            timeout_secs: env.opt_u64("SD_TIMEOUT_SECS")?,
        };

        if cfg.steps == 0 || cfg.width == 0 || cfg.height == 0 {
            return Err(ConfigError::OutOfRange {
                field: "SD_STEPS/SD_WIDTH/SD_HEIGHT",
                detail: "must be greater than zero".to_string(),
            });
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvReader<'static> {
        EnvReader::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults() {
        let cfg = ImageGenConfig::from_env_reader(&env(&[])).unwrap();
        assert_eq!(cfg, ImageGenConfig::default());
        assert_eq!(cfg.base_url, "http://127.0.0.1:7860");
    }

    #[test]
    fn overrides_and_validation() {
        let cfg = ImageGenConfig::from_env_reader(&env(&[
            ("SD_URL", "http://gpu:7860/"),
            ("SD_STEPS", "40"),
            ("IMAGE_OUTPUT_DIR", "/tmp/out"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://gpu:7860");
        assert_eq!(cfg.steps, 40);
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));

        assert!(ImageGenConfig::from_env_reader(&env(&[("SD_WIDTH", "0")])).is_err());
        assert!(ImageGenConfig::from_env_reader(&env(&[("SD_URL", "gpu:7860")])).is_err());
    }
}
