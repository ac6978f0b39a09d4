//! Default Ollama configs resolved from environment variables.
//!
//! Two roles are provided:
//!
//! - **Chat** → the conversational model used by `ask`/`stream`
//! - **Embedding** → the model used by the RAG ingestion pipeline
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = chat model (default `mistral`)
//! - `OLLAMA_KEEP_ALIVE`           = keep-alive window (default `30m`)
//! - `LLM_MAX_TOKENS`              = `num_predict` (default 256)
//! - `LLM_TEMPERATURE`             = temperature (default 0.4)
//! - `LLM_TOP_P`                   = top_p (default 0.9)
//! - `EMBEDDING_MODEL`             = embedding model (default `nomic-embed-text`)
//! - `EMBEDDING_TIMEOUT_SECS`      = optional embedding request timeout

use services::env::{EnvReader, validate_http_endpoint, validate_range_f32};

use crate::{config::llm_model_config::LlmModelConfig, error_handler::AiLlmError};

pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_CHAT_MODEL: &str = "mistral";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_KEEP_ALIVE: &str = "30m";

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
///
/// # Errors
///
/// - [`services::ConfigError::InvalidNumber`] if `OLLAMA_PORT` is not a port
/// - [`services::ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
pub fn ollama_endpoint(env: &EnvReader<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = env.get("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url.trim_end_matches('/').to_string());
    }
    let port = match env.get("OLLAMA_PORT") {
        Some(p) => p
            .parse::<u16>()
            .map_err(|_| services::ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?,
        None => DEFAULT_OLLAMA_PORT,
    };
    Ok(format!("http://localhost:{port}"))
}

/// Constructs the config for the **chat** model.
///
/// # Defaults
/// - `num_predict = 256`, `temperature = 0.4`, `top_p = 0.9`
/// - `keep_alive = "30m"`
/// - no timeout
pub fn config_ollama_chat(env: &EnvReader<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(env)?;
    let model = env.string_or("OLLAMA_MODEL", DEFAULT_CHAT_MODEL);
    let max_tokens = env.opt_u32("LLM_MAX_TOKENS")?.unwrap_or(256);
    let temperature = env.opt_f32("LLM_TEMPERATURE")?.unwrap_or(0.4);
    let top_p = env.opt_f32("LLM_TOP_P")?.unwrap_or(0.9);

    validate_range_f32("temperature", temperature, 0.0, 2.0)?;
    validate_range_f32("top_p", top_p, 0.0, 1.0)?;

    Ok(LlmModelConfig {
        model,
        endpoint,
        keep_alive: Some(env.string_or("OLLAMA_KEEP_ALIVE", DEFAULT_KEEP_ALIVE)),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: Some(top_p),
        timeout_secs: None,
    })
}

/// Constructs the config for the **embedding** model.
///
/// Sampling options are left unset; they are not sent to `/api/embeddings`.
pub fn config_ollama_embedding(env: &EnvReader<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint(env)?;
    let model = env.string_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);

    Ok(LlmModelConfig {
        model,
        endpoint,
        keep_alive: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: env.opt_u64("EMBEDDING_TIMEOUT_SECS")?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvReader<'static> {
        EnvReader::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn defaults_match_the_local_setup() {
        let cfg = config_ollama_chat(&env(&[])).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:11434");
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.keep_alive.as_deref(), Some("30m"));
        assert_eq!(cfg.max_tokens, Some(256));
        assert_eq!(cfg.timeout_secs, None);

        let emb = config_ollama_embedding(&env(&[])).unwrap();
        assert_eq!(emb.model, "nomic-embed-text");
        assert_eq!(emb.temperature, None);
    }

    #[test]
    fn url_beats_port() {
        let e = env(&[("OLLAMA_URL", "http://gpu-box:11434/"), ("OLLAMA_PORT", "1")]);
        assert_eq!(ollama_endpoint(&e).unwrap(), "http://gpu-box:11434");
        let e = env(&[("OLLAMA_PORT", "9999")]);
        assert_eq!(ollama_endpoint(&e).unwrap(), "http://localhost:9999");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ollama_endpoint(&env(&[("OLLAMA_PORT", "99999")])).is_err());
        assert!(ollama_endpoint(&env(&[("OLLAMA_URL", "gpu-box")])).is_err());
        assert!(config_ollama_chat(&env(&[("LLM_TOP_P", "1.5")])).is_err());
    }
}
