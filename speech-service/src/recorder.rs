use std::future::Future;
use std::pin::Pin;

use services::CancellationToken;

use crate::config::CaptureSpec;
use crate::error_handler::Result;

/// Source of raw PCM audio.
pub trait AudioRecorder: Send + Sync {
    /// Records interleaved 16-bit samples until `spec.duration` elapses.
    ///
    /// Must return [`SpeechError::Cancelled`](crate::SpeechError::Cancelled)
    /// instead of partial audio when `cancel` fires.
    fn record<'a>(
        &'a self,
        spec: &'a CaptureSpec,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<i16>>> + Send + 'a>>;
}
