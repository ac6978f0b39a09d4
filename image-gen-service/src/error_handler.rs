use std::path::PathBuf;

use reqwest::StatusCode;
use services::{ConfigError, ErrorClass};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors raised while generating or saving an image.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "could not connect to the local image model at {base}. Start AUTOMATIC1111 with --api, then verify with: curl {base}/sdapi/v1/sd-models"
    )]
    Connection {
        base: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image server returned HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    #[error("image server returned no image")]
    EmptyResult,

    #[error("failed to decode image response: {0}")]
    Decode(String),

    #[error("failed to write image to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image generation cancelled")]
    Cancelled,
}

impl ImageGenError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ImageGenError::Config(_) => ErrorClass::Config,
            ImageGenError::Connection { .. } => ErrorClass::Connection,
            ImageGenError::HttpStatus { .. } => ErrorClass::Remote,
            ImageGenError::EmptyResult => ErrorClass::EmptyResult,
            ImageGenError::Cancelled => ErrorClass::Cancelled,
            ImageGenError::Decode(_) | ImageGenError::Io { .. } => ErrorClass::Other,
        }
    }
}
