//! Configuration parameters for melody extraction and scoring
//!
//! Defaults are tuned for short hummed or sung queries at 22.05 kHz.

use serde::{Deserialize, Serialize};

/// Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumConfig {
    // Audio processing
    pub sample_rate: u32,
    pub hop_length: usize,
    pub fft_size: usize,

    // Pitch tracking
    pub min_freq: f32,
    pub max_freq: f32,
    /// Spectral peaks below this fraction of the frame maximum are ignored
    pub peak_threshold: f32,
    /// Frames whose strongest bin is below this magnitude are unvoiced
    pub min_magnitude: f32,

    // Onset detection
    pub onset_delta: f32,
    pub onset_wait_frames: usize,

    // Tempo estimation
    pub min_tempo: f32,
    pub max_tempo: f32,
    pub default_tempo: f64,

    // Fingerprint generation
    /// Semitone jumps at or above this size are treated as tracking errors
    pub max_interval: i32,
    pub fallback_pitch_frames: usize,
    pub fallback_max_onsets: usize,

    // Scoring
    pub pitch_weight: f64,
    pub tempo_weight: f64,
}

impl Default for HumConfig {
    fn default() -> Self {
        Self {
            // Audio processing - lower rate keeps analysis cheap
            sample_rate: 22050,
            hop_length: 512,
            fft_size: 2048,

            // Pitch tracking - human voice range
            min_freq: 80.0,
            max_freq: 1000.0,
            peak_threshold: 0.1,
            min_magnitude: 1e-3,

            // Onset detection
            onset_delta: 0.07,
            onset_wait_frames: 1,

            // Tempo estimation
            min_tempo: 50.0,
            max_tempo: 220.0,
            default_tempo: 120.0,

            // Fingerprint generation
            max_interval: 22,
            fallback_pitch_frames: 100,
            fallback_max_onsets: 10,

            // Scoring
            pitch_weight: 0.6,
            tempo_weight: 0.4,
        }
    }
}

impl HumConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate == 0 {
            anyhow::bail!("Sample rate must be > 0");
        }
        if self.hop_length == 0 || self.fft_size == 0 {
            anyhow::bail!("hop_length and fft_size must be > 0");
        }
        if self.fft_size < self.hop_length {
            anyhow::bail!("fft_size must be >= hop_length");
        }
        if self.min_freq <= 0.0 || self.min_freq >= self.max_freq {
            anyhow::bail!("min_freq must be > 0 and < max_freq");
        }
        if self.max_freq > self.sample_rate as f32 / 2.0 {
            anyhow::bail!("max_freq must not exceed the Nyquist frequency");
        }
        if self.min_tempo <= 0.0 || self.min_tempo >= self.max_tempo {
            anyhow::bail!("min_tempo must be > 0 and < max_tempo");
        }
        if self.max_interval <= 0 {
            anyhow::bail!("max_interval must be > 0");
        }
        if self.pitch_weight < 0.0 || self.tempo_weight < 0.0 {
            anyhow::bail!("Scoring weights must be non-negative");
        }
        Ok(())
    }
}
