//! Low-level signal analysis
//!
//! The extractor only needs three numeric primitives from the audio: a
//! tempo estimate, a per-frame dominant pitch, and onset timestamps.
//! [`SignalAnalyzer`] is the seam for those; [`SpectralAnalyzer`] is the
//! STFT-based implementation used by default.

pub mod onset;
pub mod pitch;
pub mod tempo;

use crate::audio::Waveform;
use crate::config::HumConfig;
use crate::transform::{compute_stft, Spectrogram};
use thiserror::Error;

pub use pitch::{PitchFrame, PitchTrack};

/// Failure of one analysis step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("waveform has no sample rate")]
    InvalidSampleRate,

    #[error("signal too short for analysis: {samples} samples (need {required})")]
    SignalTooShort { samples: usize, required: usize },

    #[error("onset envelope too short for tempo estimation: {frames} frames (need {required})")]
    EnvelopeTooShort { frames: usize, required: usize },

    #[error("no periodicity found in onset envelope")]
    NoPeriodicity,
}

/// Results of a full analysis pass, one outcome per step
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tempo: Result<f64, AnalysisError>,
    pub pitch_track: Result<PitchTrack, AnalysisError>,
    pub onsets: Result<Vec<f64>, AnalysisError>,
}

/// Source of tempo, pitch and onset measurements
pub trait SignalAnalyzer: Send + Sync {
    /// Beats per minute
    fn estimate_tempo(&self, waveform: &Waveform) -> Result<f64, AnalysisError>;

    /// Dominant pitch per analysis frame, 0 Hz where unvoiced
    fn pitch_track(&self, waveform: &Waveform) -> Result<PitchTrack, AnalysisError>;

    /// Strictly increasing onset times in seconds
    fn detect_onsets(&self, waveform: &Waveform) -> Result<Vec<f64>, AnalysisError>;

    /// Run every step. Implementations may override to share work.
    fn analyze(&self, waveform: &Waveform) -> Analysis {
        Analysis {
            tempo: self.estimate_tempo(waveform),
            pitch_track: self.pitch_track(waveform),
            onsets: self.detect_onsets(waveform),
        }
    }
}

/// STFT-based analyzer
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    config: HumConfig,
}

impl SpectralAnalyzer {
    pub fn new(config: &HumConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn spectrogram(&self, waveform: &Waveform) -> Result<Spectrogram, AnalysisError> {
        if waveform.sample_rate != self.config.sample_rate {
            log::debug!(
                "Analyzing {} Hz audio (configured for {} Hz)",
                waveform.sample_rate,
                self.config.sample_rate
            );
        }
        compute_stft(waveform, &self.config)
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new(&HumConfig::default())
    }
}

impl SignalAnalyzer for SpectralAnalyzer {
    fn estimate_tempo(&self, waveform: &Waveform) -> Result<f64, AnalysisError> {
        let spectrogram = self.spectrogram(waveform)?;
        let envelope = onset::onset_envelope(&spectrogram);
        tempo::estimate_tempo(&envelope, spectrogram.frame_duration, &self.config)
    }

    fn pitch_track(&self, waveform: &Waveform) -> Result<PitchTrack, AnalysisError> {
        let spectrogram = self.spectrogram(waveform)?;
        Ok(pitch::track_pitch(&spectrogram, &self.config))
    }

    fn detect_onsets(&self, waveform: &Waveform) -> Result<Vec<f64>, AnalysisError> {
        let spectrogram = self.spectrogram(waveform)?;
        let envelope = onset::onset_envelope(&spectrogram);
        Ok(onset::OnsetDetector::new(&self.config).detect(&envelope, spectrogram.frame_duration))
    }

    fn analyze(&self, waveform: &Waveform) -> Analysis {
        let spectrogram = match self.spectrogram(waveform) {
            Ok(spectrogram) => spectrogram,
            Err(e) => {
                return Analysis {
                    tempo: Err(e.clone()),
                    pitch_track: Err(e.clone()),
                    onsets: Err(e),
                }
            }
        };

        let envelope = onset::onset_envelope(&spectrogram);
        let frame_duration = spectrogram.frame_duration;

        Analysis {
            tempo: tempo::estimate_tempo(&envelope, frame_duration, &self.config),
            pitch_track: Ok(pitch::track_pitch(&spectrogram, &self.config)),
            onsets: Ok(onset::OnsetDetector::new(&self.config).detect(&envelope, frame_duration)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, secs: f32) -> Vec<f32> {
        let n = (secs * 22050.0) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 22050.0).sin())
            .collect()
    }

    #[test]
    fn test_analyze_matches_individual_steps() {
        let analyzer = SpectralAnalyzer::default();
        let mut samples = tone(440.0, 1.0);
        samples.extend(tone(523.25, 1.0));
        let waveform = Waveform::new(samples, 22050);

        let analysis = analyzer.analyze(&waveform);
        assert_eq!(analysis.pitch_track.unwrap(), analyzer.pitch_track(&waveform).unwrap());
        assert_eq!(analysis.onsets.unwrap(), analyzer.detect_onsets(&waveform).unwrap());
    }

    #[test]
    fn test_empty_waveform_fails_every_step() {
        let analysis = SpectralAnalyzer::default().analyze(&Waveform::new(Vec::new(), 22050));
        assert!(analysis.tempo.is_err());
        assert!(analysis.pitch_track.is_err());
        assert!(analysis.onsets.is_err());
    }
}
