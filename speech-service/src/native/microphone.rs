use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use services::CancellationToken;
use tracing::{debug, warn};

use crate::config::CaptureSpec;
use crate::error_handler::{Result, SpeechError};
use crate::recorder::AudioRecorder;
use crate::resample::to_capture_format;

/// Records from the host's default input device.
///
/// The device is opened in its default format and the samples are
/// converted to `spec` afterwards. The `cpal` stream lives on a dedicated
/// blocking thread; the async side only signals it to stop early.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrophoneRecorder;

impl AudioRecorder for MicrophoneRecorder {
    fn record<'a>(
        &'a self,
        spec: &'a CaptureSpec,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<i16>>> + Send + 'a>> {
        Box::pin(async move {
            let spec = *spec;
            let (stop_tx, stop_rx) = mpsc::channel::<()>();

            let watcher = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    cancel.cancelled().await;
                    let _ = stop_tx.send(());
                })
            };

            let outcome = tokio::task::spawn_blocking(move || capture_blocking(spec, stop_rx)).await;
            watcher.abort();

            outcome.map_err(|e| SpeechError::Device(format!("capture thread failed: {e}")))?
        })
    }
}

fn capture_blocking(spec: CaptureSpec, stop: mpsc::Receiver<()>) -> Result<Vec<i16>> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(SpeechError::NoInputDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| SpeechError::Device(e.to_string()))?;
    let format = supported.sample_format();
    let config = supported.config();
    debug!(
        device = %device.name().unwrap_or_default(),
        rate = config.sample_rate.0,
        channels = config.channels,
        format = ?format,
        "opening input device"
    );

    let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::with_capacity(
        config.sample_rate.0 as usize
            * spec.duration.as_secs() as usize
            * usize::from(config.channels),
    )));

    let stream = match format {
        SampleFormat::F32 => input_stream::<f32>(&device, &config, Arc::clone(&buffer)),
        SampleFormat::I16 => input_stream::<i16>(&device, &config, Arc::clone(&buffer)),
        SampleFormat::U16 => input_stream::<u16>(&device, &config, Arc::clone(&buffer)),
        other => {
            return Err(SpeechError::Device(format!(
                "unsupported input sample format {other:?}"
            )));
        }
    }?;
    stream
        .play()
        .map_err(|e| SpeechError::Device(e.to_string()))?;

    // Ok(()) or a dropped sender both mean the caller gave up.
    match stop.recv_timeout(spec.duration) {
        Err(RecvTimeoutError::Timeout) => {}
        Ok(()) | Err(RecvTimeoutError::Disconnected) => return Err(SpeechError::Cancelled),
    }
    drop(stream);

    let raw = buffer
        .lock()
        .map(|mut guard| std::mem::take(&mut *guard))
        .map_err(|_| SpeechError::Device("capture buffer poisoned".into()))?;
    Ok(to_capture_format(
        &raw,
        config.channels,
        config.sample_rate.0,
        &spec,
    ))
}

/// Input stream in the device's native sample type, stored as `f32`.
fn input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend(data.iter().map(|&s| s.to_sample::<f32>()));
                }
            },
            |err| warn!(error = %err, "input stream error"),
            None,
        )
        .map_err(|e| SpeechError::Device(e.to_string()))
}
