//! AUTOMATIC1111 txt2img client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use services::env::validate_http_endpoint;
use services::http::{join_url, status_and_snippet};
use services::{CancellationToken, cancellable};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::config::ImageGenConfig;
use crate::error_handler::{ImageGenError, Result};

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    steps: u32,
    width: u32,
    height: u32,
    cfg_scale: f32,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Option<Vec<String>>,
}

/// Client for a local AUTOMATIC1111 server started with `--api`.
#[derive(Debug, Clone)]
pub struct ImageService {
    client: reqwest::Client,
    cfg: ImageGenConfig,
}

impl ImageService {
    /// Creates a service that shares `client`.
    pub fn with_client(client: reqwest::Client, cfg: ImageGenConfig) -> Result<Self> {
        validate_http_endpoint("SD_URL", &cfg.base_url)?;
        info!(base = %cfg.base_url, out = %cfg.output_dir.display(), "ImageService initialized");
        Ok(Self { client, cfg })
    }

    pub fn config(&self) -> &ImageGenConfig {
        &self.cfg
    }

    /// Generates one image for `prompt` and returns the path it was saved to.
    ///
    /// # Errors
    /// - [`ImageGenError::Connection`] if the server is unreachable
    /// - [`ImageGenError::HttpStatus`] for a non-2xx answer
    /// - [`ImageGenError::EmptyResult`] if no non-blank image came back
    /// - [`ImageGenError::Decode`] for an unparsable body or invalid base64
    /// - [`ImageGenError::Io`] if the file cannot be written
    /// - [`ImageGenError::Cancelled`] if `cancel` fires first
    #[instrument(skip_all, fields(steps = self.cfg.steps, width = self.cfg.width, height = self.cfg.height))]
    pub async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<PathBuf> {
        let url = join_url(&self.cfg.base_url, "/sdapi/v1/txt2img");
        let body = Txt2ImgRequest {
            prompt,
            steps: self.cfg.steps,
            width: self.cfg.width,
            height: self.cfg.height,
            cfg_scale: self.cfg.cfg_scale,
        };

        let parsed: Txt2ImgResponse = cancellable(cancel, async {
            debug!("POST {}", url);
            let mut req = self.client.post(&url).json(&body);
            if let Some(secs) = self.cfg.timeout_secs {
                req = req.timeout(Duration::from_secs(secs));
            }
            let resp = req.send().await.map_err(|source| self.connection(source))?;
            if !resp.status().is_success() {
                let (status, snippet) = status_and_snippet(resp).await;
                return Err(ImageGenError::HttpStatus {
                    status,
                    url: url.clone(),
                    snippet,
                });
            }
            resp.json::<Txt2ImgResponse>()
                .await
                .map_err(|e| ImageGenError::Decode(e.to_string()))
        })
        .await
        .ok_or(ImageGenError::Cancelled)??;

        let first = parsed
            .images
            .and_then(|images| images.into_iter().next())
            .filter(|s| !s.trim().is_empty())
            .ok_or(ImageGenError::EmptyResult)?;
        let bytes = decode_image(&first)?;

        let path = self.write_png(&bytes, Local::now()).await?;
        info!(path = %path.display(), bytes = bytes.len(), "image saved");
        Ok(path)
    }

    /// Lists the installed checkpoints and returns how many there are.
    #[instrument(skip_all)]
    pub async fn health(&self, cancel: &CancellationToken) -> Result<usize> {
        let url = join_url(&self.cfg.base_url, "/sdapi/v1/sd-models");
        cancellable(cancel, async {
            let resp = self
                .client
                .get(&url)
                .timeout(Duration::from_secs(5))
                .send()
                .await
                .map_err(|source| self.connection(source))?;
            if !resp.status().is_success() {
                let (status, snippet) = status_and_snippet(resp).await;
                return Err(ImageGenError::HttpStatus {
                    status,
                    url: url.clone(),
                    snippet,
                });
            }
            let models: Vec<serde_json::Value> = resp
                .json()
                .await
                .map_err(|e| ImageGenError::Decode(e.to_string()))?;
            Ok(models.len())
        })
        .await
        .ok_or(ImageGenError::Cancelled)?
    }

    fn connection(&self, source: reqwest::Error) -> ImageGenError {
        ImageGenError::Connection {
            base: self.cfg.base_url.clone(),
            source,
        }
    }

    async fn write_png(&self, bytes: &[u8], now: DateTime<Local>) -> Result<PathBuf> {
        let dir = &self.cfg.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ImageGenError::Io {
                path: dir.clone(),
                source,
            })?;

        write_new(dir, &file_name(now), bytes).await
    }
}

/// `generated-YYYYMMDD-HHMMSS-mmm.png` for the given local time.
pub fn file_name(now: DateTime<Local>) -> String {
    now.format("generated-%Y%m%d-%H%M%S-%3f.png").to_string()
}

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes `bytes` to `dir/name`, appending `-1`, `-2`, ... before the
/// extension while the name is taken. Never overwrites an existing file.
async fn write_new(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let stem = name.trim_end_matches(".png");
    for n in 0..MAX_NAME_ATTEMPTS {
        let path = match n {
            0 => dir.join(name),
            n => dir.join(format!("{stem}-{n}.png")),
        };
        let io_err = |source| ImageGenError::Io {
            path: path.clone(),
            source,
        };
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_err(e)),
        };
        file.write_all(bytes).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        return Ok(path);
    }
    Err(ImageGenError::Io {
        path: dir.join(name),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free file name after {MAX_NAME_ATTEMPTS} attempts"),
        ),
    })
}

/// Decodes a base64 image, tolerating a `data:image/...;base64,` prefix.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.trim().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ImageGenError::Decode("data URL without payload".into()))?,
        None => encoded.trim(),
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageGenError::Decode(format!("invalid base64 image: {e}")))?;
    if bytes.is_empty() {
        return Err(ImageGenError::EmptyResult);
    }
    Ok(bytes)
}
