//! Aggregated configuration for all services.

use ai_llm_service::LlmModelConfig;
use ai_llm_service::config::default_config::{config_ollama_chat, config_ollama_embedding};
use image_gen_service::ImageGenConfig;
use rag_store::RagConfig;
use services::EnvReader;
use speech_service::SpeechConfig;

use crate::error_handler::AppError;

/// Everything the [`Assistant`](crate::Assistant) needs to build its clients.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chat: LlmModelConfig,
    pub embedding: LlmModelConfig,
    pub image: ImageGenConfig,
    pub speech: SpeechConfig,
    pub rag: RagConfig,
}

impl AppConfig {
    /// Load shared state from an environment-like source.
    ///
    /// # Errors
    /// The first invalid value encountered.
    pub fn from_env_reader(env: &EnvReader<'_>) -> Result<Self, AppError> {
        Ok(Self {
            chat: config_ollama_chat(env)?,
            embedding: config_ollama_embedding(env)?,
            image: ImageGenConfig::from_env_reader(env)?,
            speech: SpeechConfig::from_env_reader(env)?,
            rag: RagConfig::from_env_reader(env).map_err(AppError::Rag)?,
        })
    }

    /// Same as [`from_env_reader`](Self::from_env_reader) over the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_env_reader(&EnvReader::process())
    }

    /// Whether ingestion should draw a progress bar.
    pub fn with_progress(mut self, on: bool) -> Self {
        self.rag.show_progress = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_has_a_default() {
        let cfg = AppConfig::from_env_reader(&EnvReader::from_map(Default::default())).unwrap();
        assert_eq!(cfg.chat.model, "mistral");
        assert_eq!(cfg.embedding.model, "nomic-embed-text");
        assert_eq!(cfg.image.base_url, "http://127.0.0.1:7860");
        assert_eq!(cfg.rag.collection, "localchat_rag");
        assert_eq!(cfg.rag.chunk_size, 900);
        assert_eq!(cfg.speech.language, "en");
    }

    #[test]
    fn invalid_values_surface_as_config_errors() {
        let env = EnvReader::new(|k| (k == "LLM_TEMPERATURE").then(|| "9".to_string()));
        let err = AppConfig::from_env_reader(&env).unwrap_err();
        assert_eq!(err.class(), services::ErrorClass::Config);
    }
}
