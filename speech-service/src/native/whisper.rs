use std::path::Path;

use tracing::debug;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::error_handler::{Result, SpeechError};
use crate::transcriber::Transcriber;
use crate::wav::decode_wav_mono_f32;

const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// whisper.cpp via `whisper-rs`, greedy decoding.
///
/// The model is loaded on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhisperTranscriber;

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, model_path: &Path, wav: &[u8], language: &str) -> Result<Vec<String>> {
        let (audio, rate) = decode_wav_mono_f32(wav)?;
        if rate != WHISPER_SAMPLE_RATE {
            return Err(SpeechError::Transcription(format!(
                "expected {WHISPER_SAMPLE_RATE} Hz audio, got {rate} Hz"
            )));
        }

        let path = model_path
            .to_str()
            .ok_or_else(|| SpeechError::Transcription("model path is not valid UTF-8".into()))?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| SpeechError::Transcription(format!("loading model: {e}")))?;
        let mut state = ctx
            .create_state()
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio)
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;

        let n = state
            .full_n_segments()
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;
        let mut segments = Vec::with_capacity(n.max(0) as usize);
        for i in 0..n {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SpeechError::Transcription(e.to_string()))?;
            segments.push(text);
        }
        debug!(segments = segments.len(), samples = audio.len(), "whisper done");
        Ok(segments)
    }
}
