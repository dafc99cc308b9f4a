//! Onset detection
//!
//! The onset envelope is the positive spectral flux of the log-magnitude
//! spectrogram, averaged across bins. Peaks of the normalised envelope
//! are picked against a local maximum and a local mean, then moved back
//! to the preceding envelope minimum so each onset marks where the note
//! begins rather than where its attack is steepest.

use crate::config::HumConfig;
use crate::transform::Spectrogram;

/// Floor for log-magnitude conversion
const AMIN: f32 = 1e-5;
/// Dynamic range kept below the loudest bin, in dB
const TOP_DB: f32 = 80.0;

/// Per-frame onset strength, aligned with the spectrogram frames
pub fn onset_envelope(spectrogram: &Spectrogram) -> Vec<f32> {
    let num_frames = spectrogram.num_frames;
    if num_frames == 0 || spectrogram.num_bins == 0 {
        return Vec::new();
    }

    let mut log_spec: Vec<Vec<f32>> = spectrogram
        .magnitudes
        .iter()
        .map(|frame| frame.iter().map(|&m| 20.0 * m.max(AMIN).log10()).collect())
        .collect();

    let peak_db = log_spec
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor_db = peak_db - TOP_DB;
    for frame in log_spec.iter_mut() {
        for value in frame.iter_mut() {
            *value = value.max(floor_db);
        }
    }

    let mut envelope = vec![0.0; num_frames];
    for t in 1..num_frames {
        let rise: f32 = log_spec[t]
            .iter()
            .zip(&log_spec[t - 1])
            .map(|(&curr, &prev)| (curr - prev).max(0.0))
            .sum();
        envelope[t] = rise / spectrogram.num_bins as f32;
    }

    envelope
}

pub struct OnsetDetector {
    /// Required height above the local mean of the normalised envelope
    delta: f32,
    /// Minimum number of frames between picked peaks
    wait: usize,
}

impl OnsetDetector {
    pub fn new(config: &HumConfig) -> Self {
        Self {
            delta: config.onset_delta,
            wait: config.onset_wait_frames,
        }
    }

    /// Onset times in seconds, strictly increasing
    pub fn detect(&self, envelope: &[f32], frame_duration: f64) -> Vec<f64> {
        let Some(normalized) = normalize(envelope) else {
            return Vec::new();
        };

        let peaks = self.peak_pick(&normalized, frame_duration);

        let mut frames: Vec<usize> = peaks.iter().map(|&p| backtrack(envelope, p)).collect();
        frames.dedup();

        frames
            .into_iter()
            .map(|frame| frame as f64 * frame_duration)
            .collect()
    }

    fn peak_pick(&self, signal: &[f32], frame_duration: f64) -> Vec<usize> {
        let frames_for = |secs: f64| (secs / frame_duration).round() as usize;
        let pre_max = frames_for(0.03).max(1);
        let post_max = 1;
        let pre_avg = frames_for(0.10).max(1);
        let post_avg = frames_for(0.10) + 1;

        let len = signal.len();
        let mut peaks: Vec<usize> = Vec::new();

        for i in 0..len {
            let max_start = i.saturating_sub(pre_max);
            let max_end = (i + post_max).min(len - 1);
            if signal[max_start..=max_end].iter().any(|&v| v > signal[i]) {
                continue;
            }

            let avg_start = i.saturating_sub(pre_avg);
            let avg_end = (i + post_avg).min(len - 1);
            let window = &signal[avg_start..=avg_end];
            let mean = window.iter().sum::<f32>() / window.len() as f32;
            if signal[i] < mean + self.delta {
                continue;
            }

            if let Some(&last) = peaks.last() {
                if i <= last + self.wait {
                    continue;
                }
            }

            peaks.push(i);
        }

        peaks
    }
}

/// Scale to [0, 1]; `None` for a flat envelope
fn normalize(envelope: &[f32]) -> Option<Vec<f32>> {
    if envelope.len() < 3 {
        return None;
    }
    let min = envelope.iter().copied().fold(f32::INFINITY, f32::min);
    let max = envelope.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range < 1e-9 {
        return None;
    }
    Some(envelope.iter().map(|&v| (v - min) / range).collect())
}

/// Walk back from a peak to the nearest preceding local minimum
fn backtrack(envelope: &[f32], peak: usize) -> usize {
    let mut i = peak;
    while i > 0 && envelope[i - 1] < envelope[i] {
        i -= 1;
    }
    i
}
