//! Conversion from whatever the input device delivers to the capture format.
//!
//! Devices usually run at their mix format (44.1/48 kHz, stereo, `f32`);
//! transcription wants 16 kHz mono PCM.

use crate::config::CaptureSpec;

/// Averages interleaved frames down to one channel.
///
/// A trailing partial frame is dropped.
pub fn downmix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampling of a mono signal.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len() - 1;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

/// Interleaved device samples → mono `i16` at `spec.sample_rate`.
pub fn to_capture_format(
    interleaved: &[f32],
    device_channels: u16,
    device_rate: u32,
    spec: &CaptureSpec,
) -> Vec<i16> {
    let mono = downmix_to_mono(interleaved, device_channels);
    resample_linear(&mono, device_rate, spec.sample_rate)
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn spec() -> CaptureSpec {
        CaptureSpec {
            sample_rate: 16_000,
            channels: 1,
            duration: Duration::from_secs(1),
        }
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let mono = downmix_to_mono(&[0.5, -0.5, 1.0, 0.0, 0.2, 0.4, 0.9], 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
        assert!((mono[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn downsampling_keeps_duration_and_shape() {
        let ramp: Vec<f32> = (0..48).map(|i| i as f32 / 48.0).collect();
        let out = resample_linear(&ramp, 48_000, 16_000);
        assert_eq!(out.len(), 16);
        for (i, s) in out.iter().enumerate() {
            assert!((s - (i * 3) as f32 / 48.0).abs() < 1e-6);
        }
    }

    #[test]
    fn upsampling_interpolates() {
        let out = resample_linear(&[0.0, 1.0], 8_000, 16_000);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn device_mix_format_becomes_16k_mono_pcm() {
        // One second of 48 kHz stereo at a constant level.
        let interleaved = vec![0.5_f32; 48_000 * 2];
        let pcm = to_capture_format(&interleaved, 2, 48_000, &spec());
        assert_eq!(pcm.len(), 16_000);
        assert!(pcm.iter().all(|&s| s == 16_384));
    }

    #[test]
    fn matching_format_passes_through_with_clipping() {
        let pcm = to_capture_format(&[0.0, 1.0, -1.0, 2.0], 1, 16_000, &spec());
        assert_eq!(pcm, [0, i16::MAX, -i16::MAX, i16::MAX]);
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert!(to_capture_format(&[], 2, 44_100, &spec()).is_empty());
    }
}
