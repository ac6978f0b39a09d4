//! Client for a local Ollama text-generation server.
//!
//! - [`OllamaService::ask`]: one-shot generation
//! - [`OllamaService::stream`]: incremental fragments from the NDJSON stream
//! - [`OllamaService::embeddings`]: embedding vector for a text
//!
//! Configuration comes from [`config::default_config`]; errors are unified in
//! [`error_handler::AiLlmError`].

pub mod clients;
pub mod config;
pub mod error_handler;

pub use clients::ollama_service::{OllamaService, TextStream};
pub use clients::stream_decoder::{NdjsonDecoder, StreamEvent};
pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, Result};
