//! Short-time Fourier transform
//!
//! Centered, Hann-windowed frames with one frame per hop, so frame `t`
//! describes the audio around `t * hop_length` samples. This matches the
//! framing the pitch track and onset envelope are indexed by.

use crate::analysis::AnalysisError;
use crate::audio::Waveform;
use crate::config::HumConfig;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Magnitude spectrogram
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude values [time_frame][frequency_bin]
    pub magnitudes: Vec<Vec<f32>>,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins (fft_size / 2 + 1)
    pub num_bins: usize,
    /// Width of one frequency bin in Hz
    pub bin_hz: f32,
    /// Seconds between consecutive frames
    pub frame_duration: f64,
}

impl Spectrogram {
    /// Frequency in Hz of a (possibly fractional) bin index
    pub fn bin_frequency(&self, bin: f32) -> f32 {
        bin * self.bin_hz
    }

    /// Bin index closest to a frequency, clamped to the spectrum
    pub fn frequency_bin(&self, freq: f32) -> usize {
        ((freq / self.bin_hz).round() as usize).min(self.num_bins.saturating_sub(1))
    }

    /// Timestamp of a frame centre in seconds
    pub fn frame_time(&self, frame: usize) -> f64 {
        frame as f64 * self.frame_duration
    }
}

/// Compute the magnitude STFT of a waveform
pub fn compute_stft(waveform: &Waveform, config: &HumConfig) -> Result<Spectrogram, AnalysisError> {
    if waveform.sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate);
    }
    if waveform.samples.is_empty() {
        return Err(AnalysisError::SignalTooShort {
            samples: 0,
            required: 1,
        });
    }

    let hop_size = config.hop_length;
    let fft_size = config.fft_size;
    let samples = &waveform.samples;

    let num_frames = 1 + samples.len() / hop_size;
    let num_bins = fft_size / 2 + 1;
    let half = (fft_size / 2) as isize;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window = create_hann_window(fft_size);

    let mut magnitudes = Vec::with_capacity(num_frames);
    let mut frame = vec![Complex::new(0.0f32, 0.0); fft_size];

    for frame_idx in 0..num_frames {
        let centre = (frame_idx * hop_size) as isize;

        // Zero padding outside the signal
        for (i, slot) in frame.iter_mut().enumerate() {
            let pos = centre - half + i as isize;
            let sample = if pos >= 0 && (pos as usize) < samples.len() {
                samples[pos as usize]
            } else {
                0.0
            };
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut frame);

        magnitudes.push(frame[..num_bins].iter().map(|c| c.norm()).collect());
    }

    Ok(Spectrogram {
        magnitudes,
        num_frames,
        num_bins,
        bin_hz: waveform.sample_rate as f32 / fft_size as f32,
        frame_duration: hop_size as f64 / waveform.sample_rate as f64,
    })
}

/// Periodic Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, secs: f32, sample_rate: u32) -> Waveform {
        let n = (secs * sample_rate as f32) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        Waveform::new(samples, sample_rate)
    }

    #[test]
    fn test_hann_window() {
        let window = create_hann_window(512);
        assert_eq!(window.len(), 512);
        assert!(window[0].abs() < 0.001);
        assert!((window[256] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_frame_count_is_centered() {
        let config = HumConfig::default();
        let spec = compute_stft(&sine(440.0, 1.0, 22050), &config).unwrap();
        assert_eq!(spec.num_frames, 1 + 22050 / 512);
        assert_eq!(spec.num_bins, 1025);
        assert!((spec.frame_time(1) - 512.0 / 22050.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak_bin_matches_tone() {
        let config = HumConfig::default();
        let spec = compute_stft(&sine(440.0, 1.0, 22050), &config).unwrap();
        let frame = &spec.magnitudes[spec.num_frames / 2];
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, spec.frequency_bin(440.0));
    }

    #[test]
    fn test_empty_signal_is_rejected() {
        let config = HumConfig::default();
        let result = compute_stft(&Waveform::new(Vec::new(), 22050), &config);
        assert!(matches!(result, Err(AnalysisError::SignalTooShort { .. })));
    }
}
