//! In-memory WAV container handling.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::config::CaptureSpec;
use crate::error_handler::Result;

/// Wraps interleaved 16-bit samples in a finalized WAV file.
pub fn encode_wav(samples: &[i16], spec: &CaptureSpec) -> Result<Vec<u8>> {
    let wav_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, wav_spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decodes WAV bytes into mono `f32` samples in `[-1, 1]`.
///
/// Multi-channel input is averaged per frame. Returns the samples and the
/// sample rate.
pub fn decode_wav_mono_f32(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader.into_samples::<f32>().collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32_768.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn mono_samples_survive_the_container() {
        let spec = CaptureSpec::default();
        let bytes = encode_wav(&[0, 16_384, -32_768, 32_767], &spec).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        let (samples, rate) = decode_wav_mono_f32(&bytes).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
        assert!(samples[3] < 1.0 && samples[3] > 0.999);
    }

    #[test]
    fn stereo_is_downmixed() {
        let spec = CaptureSpec {
            sample_rate: 16_000,
            channels: 2,
            duration: Duration::from_secs(1),
        };
        let bytes = encode_wav(&[16_384, 0, -16_384, -16_384], &spec).unwrap();
        let (samples, _) = decode_wav_mono_f32(&bytes).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.25).abs() < 1e-6);
        assert!((samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_capture_is_still_a_valid_file() {
        let bytes = encode_wav(&[], &CaptureSpec::default()).unwrap();
        let (samples, _) = decode_wav_mono_f32(&bytes).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_wav_mono_f32(b"definitely not a wav").is_err());
    }
}
