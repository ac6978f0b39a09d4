/// Configuration for one Ollama model invocation.
///
/// # Fields
///
/// - `model`: The model name Ollama exposes (e.g., `"mistral"`), not a path.
/// - `endpoint`: Base URL of the server (e.g., `http://localhost:11434`).
/// - `keep_alive`: How long Ollama keeps the model loaded after the call.
/// - `max_tokens`: Sent as `options.num_predict`.
/// - `temperature`: Sampling temperature.
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Per-request timeout for one-shot calls. Streaming
///   requests never time out.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "mistral".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     keep_alive: Some("30m".to_string()),
///     max_tokens: Some(256),
///     temperature: Some(0.4),
///     top_p: Some(0.9),
///     timeout_secs: None,
/// };
/// assert_eq!(cfg.model, "mistral");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier string (e.g., `"mistral"`, `"nomic-embed-text"`).
    pub model: String,

    /// Server base URL.
    pub endpoint: String,

    /// Optional `keep_alive` duration string (e.g., `"30m"`).
    pub keep_alive: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
