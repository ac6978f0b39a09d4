//! Text-to-image generation against a local AUTOMATIC1111 server.
//!
//! [`ImageService::generate`] posts a prompt to `/sdapi/v1/txt2img`, decodes
//! the first returned image and writes it under the configured output
//! directory as `generated-YYYYMMDD-HHMMSS-mmm.png`.

pub mod config;
pub mod error_handler;
pub mod image_service;

pub use config::ImageGenConfig;
pub use error_handler::{ImageGenError, Result};
pub use image_service::ImageService;
