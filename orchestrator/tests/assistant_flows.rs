use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_llm_service::LlmModelConfig;
use axum::body::Body;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream;
use futures::StreamExt;
use image_gen_service::ImageGenConfig;
use orchestrator::{AppConfig, AppError, AskOutcome, Assistant, DictationOutcome};
use rag_store::RagConfig;
use serde_json::{Value, json};
use services::CancellationToken;
use speech_service::{
    AudioRecorder, CaptureSpec, SpeechConfig, SpeechService, Transcriber,
};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\norchestrated";

async fn generate(Json(body): Json<Value>) -> Body {
    let lines: Vec<Result<String, std::io::Error>> = match body["prompt"].as_str() {
        Some("slow") => {
            let first: Vec<Result<String, std::io::Error>> = vec![Ok("{\"response\":\"thinking\",\"done\":false}\n".to_string())];
            return Body::from_stream(stream::iter(first).chain(stream::pending()));
        }
        Some("silent") => vec![Ok("{\"response\":\"\",\"done\":true}\n".into())],
        _ => vec![
            Ok("{\"response\":\"Rust \",\"done\":false}\n".into()),
            Ok("{\"response\":\"is fast.\",\"done\":false}\n".into()),
            Ok("{\"response\":\"\",\"done\":true}\n".into()),
        ],
    };
    Body::from_stream(stream::iter(lines))
}

async fn spawn() -> String {
    let app = Router::new()
        .route("/api/generate", post(generate))
        .route(
            "/api/tags",
            get(|| async { Json(json!({ "models": [{ "name": "mistral:latest" }] })) }),
        )
        .route(
            "/sdapi/v1/txt2img",
            post(|| async {
                use base64::Engine;
                let b64 = base64::engine::general_purpose::STANDARD.encode(PNG);
                Json(json!({ "images": [b64] }))
            }),
        )
        .route(
            "/sdapi/v1/sd-models",
            get(|| async { Json(json!([{ "title": "v1-5" }])) }),
        )
        .route(
            "/api/v1/heartbeat",
            get(|| async { Json(json!({ "nanosecond heartbeat": 1 })) }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base: &str, out: &Path) -> AppConfig {
    let llm = |model: &str| LlmModelConfig {
        model: model.into(),
        endpoint: base.to_string(),
        keep_alive: None,
        max_tokens: Some(32),
        temperature: Some(0.4),
        top_p: Some(0.9),
        timeout_secs: None,
    };
    AppConfig {
        chat: llm("mistral"),
        embedding: llm("nomic-embed-text"),
        image: ImageGenConfig {
            base_url: base.to_string(),
            output_dir: out.to_path_buf(),
            ..ImageGenConfig::default()
        },
        speech: SpeechConfig {
            model_path: out.join("ggml-base.bin"),
            ..SpeechConfig::default()
        },
        rag: RagConfig::new_default(base, "localchat_rag"),
    }
}

async fn assistant(out: &Path) -> Assistant {
    let base = spawn().await;
    Assistant::new(reqwest::Client::new(), config(&base, out)).unwrap()
}

#[tokio::test]
async fn text_prompts_stream_fragments() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;
    let mut seen = Vec::new();

    let outcome = a
        .ask("Tell me about Rust", |f| seen.push(f.to_string()))
        .await
        .unwrap();

    assert_eq!(seen, ["Rust ", "is fast."]);
    match outcome {
        AskOutcome::Text { text, stats } => {
            assert_eq!(text, "Rust is fast.");
            assert_eq!(stats.chars, 13);
            assert!(stats.chars_per_sec > 0.0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!a.is_busy());
}

#[tokio::test]
async fn image_prompts_produce_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;

    let outcome = a
        .ask("Create an image of a black cat", |_| panic!("no text expected"))
        .await
        .unwrap();
    match outcome {
        AskOutcome::Image { path } => {
            assert!(path.starts_with(dir.path()));
            assert_eq!(std::fs::read(path).unwrap(), PNG);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn imagine_skips_routing() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;

    let path = a.imagine("a lighthouse at dusk").await.unwrap();
    assert_eq!(std::fs::read(path).unwrap(), PNG);
    assert!(matches!(a.imagine(" ").await, Err(AppError::EmptyPrompt)));
}

#[tokio::test]
async fn empty_streams_fall_back_to_a_hint() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;

    let outcome = a.ask("silent", |_| {}).await.unwrap();
    let AskOutcome::Text { text, stats } = outcome else {
        panic!("expected text");
    };
    assert!(text.starts_with("No response from local model."));
    assert_eq!(stats.chars, 0);
}

#[tokio::test]
async fn blank_prompts_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;
    assert!(matches!(
        a.ask("   ", |_| {}).await,
        Err(AppError::EmptyPrompt)
    ));
}

#[tokio::test]
async fn overlapping_requests_are_refused_and_cancel_releases_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(assistant(dir.path()).await);

    let first = {
        let a = Arc::clone(&a);
        tokio::spawn(async move { a.ask("slow", |_| {}).await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while !a.is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(matches!(a.ask("another", |_| {}).await, Err(AppError::Busy)));

    assert!(a.cancel_active());
    let err = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.user_message(), "Cancelled.");
    assert!(!a.is_busy());
    assert!(!a.cancel_active());
}

#[tokio::test]
async fn cancelling_while_idle_reports_nothing_to_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;
    assert!(!a.cancel_active());

    a.health().await;
    assert!(!a.cancel_active());
}

#[tokio::test]
async fn health_reports_every_backend() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;

    let report = a.health().await;
    let names: Vec<_> = report.iter().map(|s| s.backend.as_str()).collect();
    assert_eq!(names, ["Ollama", "StableDiffusion", "Chroma"]);
    assert!(report.iter().all(|s| s.ok), "{report:?}");
    assert_eq!(report[0].model.as_deref(), Some("mistral"));
}

#[tokio::test]
async fn unreachable_backends_are_reported_not_raised() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let dir = tempfile::tempdir().unwrap();
    let a = Assistant::new(reqwest::Client::new(), config(&base, dir.path())).unwrap();

    let report = a.health().await;
    assert_eq!(report.len(), 3);
    assert!(report.iter().all(|s| !s.ok));
}

struct CannedRecorder;

impl AudioRecorder for CannedRecorder {
    fn record<'a>(
        &'a self,
        _spec: &'a CaptureSpec,
        _cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = speech_service::Result<Vec<i16>>> + Send + 'a>> {
        Box::pin(async { Ok(vec![0; 160]) })
    }
}

struct CannedTranscriber(Mutex<Vec<Vec<String>>>);

impl Transcriber for CannedTranscriber {
    fn transcribe(
        &self,
        _model_path: &Path,
        _wav: &[u8],
        _language: &str,
    ) -> speech_service::Result<Vec<String>> {
        Ok(self.0.lock().unwrap().pop().unwrap_or_default())
    }
}

#[tokio::test]
async fn dictation_distinguishes_silence_from_speech() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("ggml-base.bin");
    std::fs::write(&model, b"model").unwrap();

    let transcriber = CannedTranscriber(Mutex::new(vec![
        vec!["  ".to_string()],
        vec![" what is".to_string(), "rust ".to_string()],
    ]));
    let speech = SpeechService::new(
        SpeechConfig {
            model_path: model,
            ..SpeechConfig::default()
        },
        Arc::new(CannedRecorder),
        Arc::new(transcriber),
    );
    let a = assistant(dir.path()).await.with_speech(speech);

    assert_eq!(
        a.dictate().await.unwrap(),
        DictationOutcome::Transcribed("what is rust".into())
    );
    assert_eq!(a.dictate().await.unwrap(), DictationOutcome::NoSpeech);
}

#[cfg(not(feature = "speech"))]
#[tokio::test]
async fn dictation_without_backends_is_explained() {
    let dir = tempfile::tempdir().unwrap();
    let a = assistant(dir.path()).await;
    let err = a.dictate().await.unwrap_err();
    assert!(matches!(err, AppError::SpeechUnavailable));
    assert!(err.user_message().contains("--features speech"));
}
