//! Ollama client for text generation and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`  : one-shot (`stream=false`) or NDJSON streaming generation
//! - `POST {endpoint}/api/embeddings`: embeddings retrieval
//!
//! The HTTP client is injected so that one connection pool is shared by every
//! service in the process.
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{LlmModelConfig, OllamaService};
//! use futures::StreamExt;
//! use services::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     model: "mistral".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     keep_alive: Some("30m".into()),
//!     max_tokens: Some(256),
//!     temperature: Some(0.4),
//!     top_p: Some(0.9),
//!     timeout_secs: None,
//! };
//!
//! let svc = OllamaService::with_client(reqwest::Client::new(), cfg)?;
//! let cancel = CancellationToken::new();
//!
//! let mut fragments = svc.stream("Write a haiku about Rust.", &cancel).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(()) }
//! ```

use std::time::Duration;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use services::env::validate_http_endpoint;
use services::http::{join_url, status_and_snippet};
use services::{CancellationToken, cancellable};
use tracing::{debug, info, instrument, warn};

use crate::clients::stream_decoder::NdjsonDecoder;
use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{AiLlmError, Result};

/// Lazy sequence of text fragments produced by [`OllamaService::stream`].
pub type TextStream = BoxStream<'static, Result<String>>;

/// Thin client for Ollama.
///
/// Provides high-level calls:
/// - [`OllamaService::ask`]       : one-shot text generation
/// - [`OllamaService::stream`]    : streamed text generation
/// - [`OllamaService::embeddings`]: embeddings retrieval
#[derive(Debug, Clone)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a service that shares `client`.
    ///
    /// # Errors
    /// [`AiLlmError::Config`] if `cfg.endpoint` is not an http(s) URL.
    pub fn with_client(client: reqwest::Client, cfg: LlmModelConfig) -> Result<Self> {
        validate_http_endpoint("endpoint", &cfg.endpoint)?;

        let url_generate = join_url(&cfg.endpoint, "/api/generate");
        let url_embeddings = join_url(&cfg.endpoint, "/api/embeddings");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = ?cfg.timeout_secs,
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embeddings,
        })
    }

    /// Configuration this service was built with.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Text returned by [`ask`](Self::ask) when the model produced nothing.
    pub fn fallback_text(&self) -> String {
        format!(
            "No response from local model. Verify Ollama and the {} model are running.",
            self.cfg.model
        )
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// A missing or blank `response` field yields [`fallback_text`](Self::fallback_text).
    ///
    /// # Errors
    /// - [`AiLlmError::Connection`] if the server cannot be reached
    /// - [`AiLlmError::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::Decode`] if the body is not JSON
    /// - [`AiLlmError::Cancelled`] if `cancel` fires first
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn ask(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, false);

        let out: GenerateResponse = cancellable(cancel, async {
            let resp = self.send_json(&self.url_generate, &body, true).await?;
            resp.json::<GenerateResponse>()
                .await
                .map_err(|e| AiLlmError::Decode(format!("{e}; ensure `stream=false` is used")))
        })
        .await
        .ok_or(AiLlmError::Cancelled)??;

        match out.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                warn!("model returned an empty response");
                Ok(self.fallback_text())
            }
        }
    }

    /// Starts a **streaming** generation request via `/api/generate`.
    ///
    /// The HTTP status is checked before the stream is returned. The stream
    /// then yields every non-empty `response` fragment in order and ends when
    /// the server sends `done: true` or closes the connection. Malformed lines
    /// are skipped. If `cancel` fires, the stream yields one
    /// [`AiLlmError::Cancelled`] and ends; the connection is dropped.
    ///
    /// # Errors
    /// Same as [`ask`](Self::ask) for establishing the stream.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn stream(&self, prompt: &str, cancel: &CancellationToken) -> Result<TextStream> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, true);

        let resp = cancellable(cancel, self.send_json(&self.url_generate, &body, false))
            .await
            .ok_or(AiLlmError::Cancelled)??;

        debug!("stream opened");
        Ok(fragments(resp.bytes_stream(), cancel.clone()))
    }

    /// Retrieves an embedding via `/api/embeddings`.
    ///
    /// # Errors
    /// - [`AiLlmError::Connection`] / [`AiLlmError::HttpStatus`] / [`AiLlmError::Decode`]
    /// - [`AiLlmError::EmptyEmbedding`] if the vector is empty
    /// - [`AiLlmError::Cancelled`] if `cancel` fires first
    #[instrument(skip_all, fields(model = %self.cfg.model, chars = input.len()))]
    pub async fn embeddings(&self, input: &str, cancel: &CancellationToken) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        let out: EmbeddingsResponse = cancellable(cancel, async {
            let resp = self.send_json(&self.url_embeddings, &body, true).await?;
            resp.json::<EmbeddingsResponse>().await.map_err(|e| {
                AiLlmError::Decode(format!("{e}; expected `{{ embedding: number[] }}`"))
            })
        })
        .await
        .ok_or(AiLlmError::Cancelled)??;

        if out.embedding.is_empty() {
            return Err(AiLlmError::EmptyEmbedding {
                model: self.cfg.model.clone(),
            });
        }
        Ok(out.embedding)
    }

    /// POSTs `body` as JSON and returns the response if it is 2xx.
    async fn send_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        apply_timeout: bool,
    ) -> Result<reqwest::Response> {
        debug!("POST {}", url);
        let mut req = self.client.post(url).json(body);
        if apply_timeout {
            if let Some(secs) = self.cfg.timeout_secs {
                req = req.timeout(Duration::from_secs(secs));
            }
        }

        let resp = req.send().await.map_err(|source| AiLlmError::Connection {
            endpoint: self.cfg.endpoint.clone(),
            source,
        })?;

        if !resp.status().is_success() {
            let (status, snippet) = status_and_snippet(resp).await;
            return Err(AiLlmError::HttpStatus {
                status,
                url: url.to_string(),
                snippet,
            });
        }
        Ok(resp)
    }
}

/// Reader state threaded through [`stream::unfold`].
struct FragmentState<S> {
    body: S,
    decoder: NdjsonDecoder,
    cancel: CancellationToken,
    eof: bool,
    finished: bool,
}

enum Read<C> {
    Cancelled,
    Chunk(Option<std::result::Result<C, reqwest::Error>>),
}

/// Turns a raw byte stream into text fragments.
fn fragments<S, C>(body: S, cancel: CancellationToken) -> TextStream
where
    S: Stream<Item = std::result::Result<C, reqwest::Error>> + Send + Unpin + 'static,
    C: AsRef<[u8]> + Send + 'static,
{
    let state = FragmentState {
        body,
        decoder: NdjsonDecoder::new(),
        cancel,
        eof: false,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }
            if st.cancel.is_cancelled() {
                st.finished = true;
                return Some((Err(AiLlmError::Cancelled), st));
            }

            let event = if st.eof {
                st.finished = true;
                st.decoder.finish()
            } else {
                st.decoder.next_event()
            };
            if let Some(event) = event {
                if event.is_final {
                    st.finished = true;
                }
                if !event.text.is_empty() {
                    return Some((Ok(event.text), st));
                }
                continue;
            }
            if st.eof {
                continue;
            }

            let read = tokio::select! {
                biased;
                _ = st.cancel.cancelled() => Read::Cancelled,
                chunk = st.body.next() => Read::Chunk(chunk),
            };
            match read {
                Read::Cancelled => {
                    st.finished = true;
                    return Some((Err(AiLlmError::Cancelled), st));
                }
                Read::Chunk(Some(Ok(bytes))) => st.decoder.push(bytes.as_ref()),
                Read::Chunk(Some(Err(e))) => {
                    st.finished = true;
                    return Some((Err(AiLlmError::Transport(e)), st));
                }
                Read::Chunk(None) => {
                    debug!(skipped = st.decoder.skipped(), "stream closed by server");
                    st.eof = true;
                }
            }
        }
    })
    .boxed()
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a str>,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, stream: bool) -> Self {
        Self {
            model: &cfg.model,
            prompt,
            stream,
            keep_alive: cfg.keep_alive.as_deref(),
            options: GenerateOptions {
                num_predict: cfg.max_tokens,
                temperature: cfg.temperature,
                top_p: cfg.top_p,
            },
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Response body for `/api/generate` with `stream=false`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}
