use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image_gen_service::{ImageGenConfig, ImageGenError, ImageService};
use serde_json::{Value, json};
use services::{CancellationToken, ErrorClass};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn service(base_url: String, out: &std::path::Path) -> ImageService {
    let cfg = ImageGenConfig {
        base_url,
        output_dir: out.join("nested").join("images"),
        ..ImageGenConfig::default()
    };
    ImageService::with_client(reqwest::Client::new(), cfg).unwrap()
}

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-payload";

#[tokio::test]
async fn writes_exactly_the_decoded_bytes() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/sdapi/v1/txt2img",
            post(
                |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({ "images": [STANDARD.encode(PNG_BYTES)], "info": "{}" }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = spawn(app).await;
    let dir = tempfile::tempdir().unwrap();

    let path = service(base, dir.path())
        .generate("a lighthouse at dusk", &CancellationToken::new())
        .await
        .unwrap();

    assert!(path.exists());
    assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("generated-") && name.ends_with(".png"), "{name}");
    assert_eq!(name.len(), "generated-YYYYMMDD-HHMMSS-mmm.png".len());

    let body = seen.lock().unwrap().take().unwrap();
    assert_eq!(body["prompt"], "a lighthouse at dusk");
    assert_eq!(body["steps"], 28);
    assert_eq!(body["width"], 768);
}

#[tokio::test]
async fn data_url_images_are_accepted() {
    let app = Router::new().route(
        "/sdapi/v1/txt2img",
        post(|| async {
            let url = format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES));
            Json(json!({ "images": [url] }))
        }),
    );
    let base = spawn(app).await;
    let dir = tempfile::tempdir().unwrap();

    let path = service(base, dir.path())
        .generate("x", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(std::fs::read(path).unwrap(), PNG_BYTES);
}

#[tokio::test]
async fn missing_or_blank_images_are_empty_results() {
    let app = Router::new()
        .route("/sdapi/v1/txt2img", post(|| async { Json(json!({ "images": ["  "] })) }));
    let base = spawn(app).await;
    let dir = tempfile::tempdir().unwrap();

    let err = service(base, dir.path())
        .generate("x", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ImageGenError::EmptyResult));
    assert_eq!(err.class(), ErrorClass::EmptyResult);
    assert!(!dir.path().join("nested").exists());
}

#[tokio::test]
async fn server_errors_surface_status() {
    let app = Router::new().route(
        "/sdapi/v1/txt2img",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "CUDA out of memory") }),
    );
    let base = spawn(app).await;
    let dir = tempfile::tempdir().unwrap();

    let err = service(base, dir.path())
        .generate("x", &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        ImageGenError::HttpStatus {
            status, snippet, ..
        } => {
            assert_eq!(status.as_u16(), 500);
            assert!(snippet.contains("CUDA"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_names_the_verification_command() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base = format!("http://{addr}");
    let dir = tempfile::tempdir().unwrap();

    let err = service(base.clone(), dir.path())
        .generate("x", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Connection);
    assert!(
        err.to_string()
            .contains(&format!("curl {base}/sdapi/v1/sd-models"))
    );
}

#[tokio::test]
async fn health_counts_models() {
    let app = Router::new().route(
        "/sdapi/v1/sd-models",
        get(|| async {
            Json(json!([
                { "title": "sd_xl_base_1.0.safetensors" },
                { "title": "v1-5-pruned-emaonly.safetensors" }
            ]))
        }),
    );
    let base = spawn(app).await;
    let dir = tempfile::tempdir().unwrap();

    let n = service(base, dir.path())
        .health(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(n, 2);
}
