//! Incremental decoder for Ollama's newline-delimited JSON stream.
//!
//! Bytes are pushed as they arrive from the socket; complete lines are parsed
//! into [`StreamEvent`]s. Blank lines and lines that are not a JSON object of
//! the expected shape are skipped, never fatal.

use serde::Deserialize;
use tracing::{debug, warn};

/// One decoded object from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Text fragment (may be empty).
    pub text: String,
    /// `true` once the server sent `done: true`.
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Line-buffering NDJSON decoder.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buf: Vec<u8>,
    skipped: usize,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes; lines may be split across calls.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the next event from the complete lines buffered so far.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&line) {
                return Some(event);
            }
        }
        None
    }

    /// Flushes a trailing line that was not newline-terminated.
    ///
    /// Call once the body reached EOF.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        self.decode_line(&line)
    }

    /// Number of non-blank lines dropped because they failed to decode.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<GenerateChunk>(line) {
            Ok(chunk) => {
                if let Some(err) = chunk.error {
                    warn!(error = %err, "server reported an error inside the stream");
                }
                Some(StreamEvent {
                    text: chunk.response.unwrap_or_default(),
                    is_final: chunk.done,
                })
            }
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, "skipping malformed stream line");
                None
            }
        }
    }
}
