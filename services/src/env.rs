//! Environment-driven configuration helpers.
//!
//! All crates read their settings through [`EnvReader`], which wraps a lookup
//! function instead of touching `std::env` directly. The binary uses
//! [`EnvReader::process`]; tests pass a map.
//!
//! Empty or whitespace-only values are treated as unset everywhere.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `OLLAMA_PORT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `SD_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("{field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: String,
    },
}

type Lookup<'a> = Box<dyn Fn(&str) -> Option<String> + Send + Sync + 'a>;

/// Typed view over a key/value source.
pub struct EnvReader<'a> {
    lookup: Lookup<'a>,
}

impl fmt::Debug for EnvReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvReader").finish_non_exhaustive()
    }
}

impl EnvReader<'static> {
    /// Reads from the process environment.
    pub fn process() -> Self {
        Self {
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Reads from an owned map.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            lookup: Box::new(move |name| map.get(name).cloned()),
        }
    }
}

impl<'a> EnvReader<'a> {
    /// Wraps an arbitrary lookup function.
    pub fn new(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'a) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Returns the trimmed value, or `None` if unset/empty.
    pub fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Fetches a required, non-empty variable.
    ///
    /// # Errors
    /// [`ConfigError::MissingVar`] if the variable is absent or empty.
    pub fn must(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::MissingVar(name))
    }

    /// Returns the value or `default` when unset.
    pub fn string_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Parses an optional `u32` (`Ok(None)` if unset/empty).
    pub fn opt_u32(&self, name: &'static str) -> Result<Option<u32>, ConfigError> {
        self.parse_opt(name, "expected u32")
    }

    /// Parses an optional `u64` (`Ok(None)` if unset/empty).
    pub fn opt_u64(&self, name: &'static str) -> Result<Option<u64>, ConfigError> {
        self.parse_opt(name, "expected u64")
    }

    /// Parses an optional `usize` (`Ok(None)` if unset/empty).
    pub fn opt_usize(&self, name: &'static str) -> Result<Option<usize>, ConfigError> {
        self.parse_opt(name, "expected a non-negative integer")
    }

    /// Parses an optional `f32` (`Ok(None)` if unset/empty).
    pub fn opt_f32(&self, name: &'static str) -> Result<Option<f32>, ConfigError> {
        self.parse_opt(name, "expected a number")
    }

    /// Resolves an HTTP base URL from `var`, falling back to `default`,
    /// and validates its scheme.
    pub fn http_url_or(&self, var: &'static str, default: &str) -> Result<String, ConfigError> {
        let url = self.string_or(var, default);
        validate_http_endpoint(var, &url)?;
        Ok(url.trim_end_matches('/').to_string())
    }

    fn parse_opt<T: std::str::FromStr>(
        &self,
        name: &'static str,
        reason: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(name) {
            Some(v) => v
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber { var: name, reason }),
            None => Ok(None),
        }
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// [`ConfigError::InvalidFormat`] when the scheme is missing.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// [`ConfigError::OutOfRange`] if `value` is NaN/infinite or outside
/// `[min, max]`.
pub fn validate_range_f32(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: format!("expected {min}..={max}, got {value}"),
        })
    }
}
