pub mod ollama_service;
pub mod stream_decoder;
