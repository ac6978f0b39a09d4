//! Health probes for the local backends (Ollama, Stable Diffusion, Chroma).
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - Stable Diffusion: `GET {base}/sdapi/v1/sd-models` via [`ImageService::health`]
//! - Chroma: `GET {base}/api/v1/heartbeat` via [`ChromaFacade::heartbeat`]
//!
//! The returned [`HealthStatus`] is JSON-serializable. [`HealthService::check_all`]
//! is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use ai_llm_service::LlmModelConfig;
use image_gen_service::ImageService;
use rag_store::ChromaFacade;
use serde::{Deserialize, Serialize};
use services::http::{join_url, make_snippet};
use services::{CancellationToken, cancellable};
use tracing::{debug, info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A serializable health snapshot for a single backend.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend name (e.g., "Ollama", "StableDiffusion", "Chroma").
    pub backend: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Optional model identifier relevant to the probe (if any).
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(
        backend: &str,
        endpoint: &str,
        model: Option<&str>,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.to_string(),
            endpoint: endpoint.to_string(),
            model: model.map(str::to_string),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Expected minimal JSON: `{ "models": [ { "name": "<model>" }, ... ] }`.
#[derive(Deserialize)]
struct Tags {
    models: Option<Vec<Tag>>,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
}

/// Health checker reusing the application's HTTP client.
#[derive(Debug, Clone)]
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Probes every backend in turn. Never fails.
    pub async fn check_all(
        &self,
        chat: &LlmModelConfig,
        images: &ImageService,
        chroma: &ChromaFacade,
        cancel: &CancellationToken,
    ) -> Vec<HealthStatus> {
        debug!("running health probes");
        vec![
            self.check_ollama(chat, cancel).await,
            Self::check_stable_diffusion(images, cancel).await,
            Self::check_chroma(chroma, cancel).await,
        ]
    }

    /// Ollama reachability plus presence of the configured model.
    ///
    /// Tags are matched by exact name or by name without the `:latest` suffix.
    pub async fn check_ollama(
        &self,
        cfg: &LlmModelConfig,
        cancel: &CancellationToken,
    ) -> HealthStatus {
        let url = join_url(&cfg.endpoint, "/api/tags");
        let start = Instant::now();

        let outcome = cancellable(cancel, async {
            let resp = self
                .client
                .get(&url)
                .timeout(PROBE_TIMEOUT)
                .send()
                .await
                .map_err(|e| format!("unreachable: {e}. Start it with `ollama serve`"))?;
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(format!("HTTP {status}: {}", make_snippet(&text)));
            }
            Ok(resp.json::<Tags>().await)
        })
        .await;
        let latency = start.elapsed().as_millis();

        let report = |ok: bool, message: String| {
            HealthStatus::new("Ollama", &cfg.endpoint, Some(&cfg.model), ok, latency, message)
        };

        let status = match outcome {
            None => report(false, "cancelled".into()),
            Some(Err(msg)) => report(false, msg),
            Some(Ok(Ok(Tags {
                models: Some(models),
            }))) => {
                let exists = models.iter().any(|m| {
                    m.name == cfg.model
                        || m.name.strip_suffix(":latest") == Some(cfg.model.as_str())
                });
                if exists {
                    report(true, "Ollama is healthy; model is available".into())
                } else {
                    report(
                        false,
                        format!(
                            "Ollama is up, but model not found. Run: ollama pull {}",
                            cfg.model
                        ),
                    )
                }
            }
            Some(Ok(Ok(Tags { models: None }))) => report(
                true,
                "Ollama is healthy; tags response without `models` field".into(),
            ),
            Some(Ok(Err(e))) => report(
                true,
                format!("Ollama is reachable; failed to decode /api/tags: {e}"),
            ),
        };
        log_status(&status);
        status
    }

    pub async fn check_stable_diffusion(
        images: &ImageService,
        cancel: &CancellationToken,
    ) -> HealthStatus {
        let base = images.config().base_url.clone();
        let start = Instant::now();
        let result = images.health(cancel).await;
        let latency = start.elapsed().as_millis();

        let (ok, message) = match result {
            Ok(0) => (false, "server is up but no checkpoints are installed".to_string()),
            Ok(n) => (true, format!("{n} model(s) available")),
            Err(e) => (false, e.to_string()),
        };
        let status = HealthStatus::new("StableDiffusion", &base, None, ok, latency, message);
        log_status(&status);
        status
    }

    pub async fn check_chroma(chroma: &ChromaFacade, cancel: &CancellationToken) -> HealthStatus {
        let base = chroma.base_url().to_string();
        let start = Instant::now();
        let result = cancellable(cancel, chroma.heartbeat()).await;
        let latency = start.elapsed().as_millis();

        let (ok, message) = match result {
            Some(Ok(())) => (true, "heartbeat ok".to_string()),
            Some(Err(e)) => (false, e.to_string()),
            None => (false, "cancelled".to_string()),
        };
        let status = HealthStatus::new("Chroma", &base, None, ok, latency, message);
        log_status(&status);
        status
    }
}

fn log_status(status: &HealthStatus) {
    if status.ok {
        info!(
            backend = %status.backend,
            endpoint = %status.endpoint,
            model = %status.model.as_deref().unwrap_or("n/a"),
            latency_ms = status.latency_ms,
            "health probe completed"
        );
    } else {
        warn!(
            backend = %status.backend,
            endpoint = %status.endpoint,
            latency_ms = status.latency_ms,
            message = %status.message,
            "health probe failed"
        );
    }
}
