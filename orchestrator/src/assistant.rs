//! Request orchestration: one operation at a time, cancellable from outside.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use ai_llm_service::OllamaService;
use futures::StreamExt;
use image_gen_service::ImageService;
use rag_store::{IngestionResult, OllamaEmbedder, RagStore};
use services::CancellationToken;
use speech_service::SpeechService;
use tracing::{debug, info, instrument, warn};

use crate::busy::{BusyFlag, BusyGuard};
use crate::config::AppConfig;
use crate::error_handler::AppError;
use crate::health_service::{HealthService, HealthStatus};
use crate::routing::should_generate_image;

/// Throughput of one streamed answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamStats {
    pub elapsed: Duration,
    pub chars: usize,
    pub chars_per_sec: f64,
}

impl StreamStats {
    fn measure(started: Instant, chars: usize) -> Self {
        let elapsed = started.elapsed();
        Self {
            elapsed,
            chars,
            chars_per_sec: chars as f64 / elapsed.as_secs_f64().max(0.001),
        }
    }
}

/// What a prompt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Text { text: String, stats: StreamStats },
    Image { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationOutcome {
    Transcribed(String),
    /// Recording finished but no words were recognised.
    NoSpeech,
}

/// Front-end independent assistant.
pub struct Assistant {
    chat: OllamaService,
    images: ImageService,
    rag: RagStore,
    speech: Option<SpeechService>,
    health: HealthService,
    busy: BusyFlag,
    active: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("chat_model", &self.chat.config().model)
            .field("busy", &self.busy.is_busy())
            .finish_non_exhaustive()
    }
}

impl Assistant {
    /// Builds every client on top of one shared `reqwest::Client`.
    ///
    /// With the `speech` feature the microphone and whisper backends are
    /// wired in; otherwise [`dictate`](Self::dictate) reports
    /// [`AppError::SpeechUnavailable`] unless a service is injected with
    /// [`with_speech`](Self::with_speech).
    pub fn new(client: reqwest::Client, cfg: AppConfig) -> Result<Self, AppError> {
        let chat = OllamaService::with_client(client.clone(), cfg.chat)?;
        let embedder = OllamaService::with_client(client.clone(), cfg.embedding)?;
        let images = ImageService::with_client(client.clone(), cfg.image)?;
        let rag = RagStore::new(
            client.clone(),
            cfg.rag,
            Arc::new(OllamaEmbedder::new(embedder)),
        )?;

        #[cfg(feature = "speech")]
        let speech = Some(SpeechService::native(cfg.speech));
        #[cfg(not(feature = "speech"))]
        let speech = {
            debug!(model = %cfg.speech.model_path.display(), "speech backends not compiled in");
            None
        };

        Ok(Self {
            chat,
            images,
            rag,
            speech,
            health: HealthService::new(client),
            busy: BusyFlag::new(),
            active: Mutex::new(None),
        })
    }

    /// Replaces the speech pipeline.
    pub fn with_speech(mut self, speech: SpeechService) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Replaces the RAG store (e.g. to swap the text extractor).
    pub fn with_rag(mut self, rag: RagStore) -> Self {
        self.rag = rag;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Cancels the operation in flight, if any.
    ///
    /// Returns `false` when nothing cancellable was running. Health probes
    /// never register a token.
    pub fn cancel_active(&self) -> bool {
        match self.active_slot().as_ref() {
            Some(token) => {
                info!("cancelling active request");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Routes `prompt` to image generation or streamed chat.
    ///
    /// Text fragments are passed to `on_fragment` as they arrive and also
    /// accumulated into the returned [`AskOutcome::Text`]. An empty stream
    /// yields the fallback text instead.
    ///
    /// # Errors
    /// [`AppError::EmptyPrompt`], [`AppError::Busy`], or the failing service's error.
    #[instrument(skip_all, fields(chars = prompt.len()))]
    pub async fn ask<F>(&self, prompt: &str, mut on_fragment: F) -> Result<AskOutcome, AppError>
    where
        F: FnMut(&str) + Send,
    {
        let (_busy, cancel) = self.begin(prompt)?;
        let result = async {
            if should_generate_image(prompt) {
                return self.generate_image(prompt, &cancel).await;
            }

            let started = Instant::now();
            let mut fragments = self.chat.stream(prompt, &cancel).await?;
            let mut text = String::with_capacity(512);
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                on_fragment(&fragment);
                text.push_str(&fragment);
            }

            if text.is_empty() {
                warn!("stream ended without text");
                let fallback = self.chat.fallback_text();
                on_fragment(&fallback);
                return Ok(AskOutcome::Text {
                    text: fallback,
                    stats: StreamStats::measure(started, 0),
                });
            }

            let stats = StreamStats::measure(started, text.chars().count());
            info!(
                chars = stats.chars,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "answer streamed"
            );
            Ok(AskOutcome::Text { text, stats })
        }
        .await;
        self.finish();
        result
    }

    /// Like [`ask`](Self::ask) but waits for the complete answer in one request.
    #[instrument(skip_all, fields(chars = prompt.len()))]
    pub async fn ask_once(&self, prompt: &str) -> Result<AskOutcome, AppError> {
        let (_busy, cancel) = self.begin(prompt)?;
        let result = async {
            if should_generate_image(prompt) {
                return self.generate_image(prompt, &cancel).await;
            }
            let started = Instant::now();
            let text = self.chat.ask(prompt, &cancel).await?;
            let stats = StreamStats::measure(started, text.chars().count());
            Ok(AskOutcome::Text { text, stats })
        }
        .await;
        self.finish();
        result
    }

    /// Sends `prompt` to image generation regardless of its wording.
    #[instrument(skip_all, fields(chars = prompt.len()))]
    pub async fn imagine(&self, prompt: &str) -> Result<PathBuf, AppError> {
        let (_busy, cancel) = self.begin(prompt)?;
        let result = self.images.generate(prompt, &cancel).await;
        self.finish();
        Ok(result?)
    }

    /// Records one utterance and returns its transcription.
    pub async fn dictate(&self) -> Result<DictationOutcome, AppError> {
        let speech = self.speech.as_ref().ok_or(AppError::SpeechUnavailable)?;
        let (_busy, cancel) = self.begin_unchecked()?;
        let result = speech.capture_and_transcribe(&cancel).await;
        self.finish();

        let text = result?;
        if text.trim().is_empty() {
            Ok(DictationOutcome::NoSpeech)
        } else {
            Ok(DictationOutcome::Transcribed(text))
        }
    }

    /// Runs the RAG ingestion pipeline for one PDF.
    pub async fn ingest_pdf(&self, path: impl AsRef<Path>) -> Result<IngestionResult, AppError> {
        let (_busy, cancel) = self.begin_unchecked()?;
        let result = self.rag.ingest_pdf(path, &cancel).await;
        self.finish();
        Ok(result?)
    }

    /// Probes every backend. Never fails and ignores the busy flag.
    pub async fn health(&self) -> Vec<HealthStatus> {
        let cancel = CancellationToken::new();
        self.health
            .check_all(
                self.chat.config(),
                &self.images,
                self.rag.chroma(),
                &cancel,
            )
            .await
    }

    async fn generate_image(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<AskOutcome, AppError> {
        debug!("routing prompt to image generation");
        let path = self.images.generate(prompt, cancel).await?;
        Ok(AskOutcome::Image { path })
    }

    fn begin(&self, prompt: &str) -> Result<(BusyGuard, CancellationToken), AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::EmptyPrompt);
        }
        self.begin_unchecked()
    }

    /// Takes the busy flag and installs a fresh token, cancelling any previous one.
    fn begin_unchecked(&self) -> Result<(BusyGuard, CancellationToken), AppError> {
        let guard = self.busy.try_acquire().ok_or(AppError::Busy)?;
        let token = CancellationToken::new();
        if let Some(previous) = self.active_slot().replace(token.clone()) {
            previous.cancel();
        }
        Ok((guard, token))
    }

    fn finish(&self) {
        self.active_slot().take();
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
