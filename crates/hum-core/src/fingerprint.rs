//! Melodic fingerprint extraction
//!
//! A fingerprint is the tempo of a recording plus the sequence of
//! semitone steps between its consecutive notes. Notes are found by
//! cutting the pitch track at the detected onsets and quantising the
//! mean voiced frequency of each piece to the 88-key piano scale.
//!
//! Analyzer failures never abort extraction. Each failing step is
//! replaced by a neutral substitute and reported as a [`Degradation`];
//! the worst outcome is an empty fingerprint that scores 0 against
//! everything.

use crate::analysis::{PitchTrack, SignalAnalyzer, SpectralAnalyzer};
use crate::audio::Waveform;
use crate::config::HumConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Piano key of A4 (440 Hz)
const A4_KEY: f64 = 49.0;
const A4_HZ: f64 = 440.0;
const LOWEST_KEY: i32 = 1;
const HIGHEST_KEY: i32 = 88;

/// Tempo and relative-pitch sequence of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FingerprintFields")]
pub struct Fingerprint {
    /// Beats per minute
    pub tempo: f64,
    /// Semitone steps between adjacent notes, without repeats or octave jumps
    pub relative_pitches: Vec<i32>,
    /// Always `relative_pitches.len()`
    pub pitch_count: usize,
    /// Recording length in seconds
    pub duration: f64,
    pub onset_count: usize,
}

impl Fingerprint {
    pub fn new(tempo: f64, relative_pitches: Vec<i32>, duration: f64, onset_count: usize) -> Self {
        Self {
            tempo,
            pitch_count: relative_pitches.len(),
            relative_pitches,
            duration,
            onset_count,
        }
    }

    /// True when there is nothing to compare against
    pub fn is_empty(&self) -> bool {
        self.relative_pitches.is_empty()
    }
}

/// Serialized shape; absent fields default like a fresh extraction
#[derive(Deserialize)]
struct FingerprintFields {
    #[serde(default = "default_tempo")]
    tempo: f64,
    #[serde(default)]
    relative_pitches: Vec<i32>,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    onset_count: usize,
}

fn default_tempo() -> f64 {
    HumConfig::default().default_tempo
}

impl From<FingerprintFields> for Fingerprint {
    fn from(fields: FingerprintFields) -> Self {
        Fingerprint::new(
            fields.tempo,
            fields.relative_pitches,
            fields.duration,
            fields.onset_count,
        )
    }
}

/// Analyzer step that fell back to a substitute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Tempo could not be measured; the default was used
    TempoDefaulted,
    /// Pitch tracking failed; an all-unvoiced track was used
    PitchTrackSubstituted,
    /// Onset detection failed; evenly spaced onsets were used
    OnsetsSynthesized,
}

/// Fingerprint plus the fallbacks taken while computing it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fingerprint: Fingerprint,
    pub degradations: Vec<Degradation>,
}

/// Input that cannot be analyzed at all
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("waveform sample rate must be > 0")]
    ZeroSampleRate,

    #[error("waveform contains a non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
}

/// Turns waveforms into fingerprints
pub struct FingerprintExtractor<A = SpectralAnalyzer> {
    analyzer: A,
    config: HumConfig,
}

impl FingerprintExtractor<SpectralAnalyzer> {
    pub fn new(config: &HumConfig) -> Self {
        Self::with_analyzer(SpectralAnalyzer::new(config), config)
    }
}

impl<A: SignalAnalyzer> FingerprintExtractor<A> {
    pub fn with_analyzer(analyzer: A, config: &HumConfig) -> Self {
        Self {
            analyzer,
            config: config.clone(),
        }
    }

    /// Extract a fingerprint, discarding degradation details
    pub fn extract(&self, waveform: &Waveform) -> Result<Fingerprint, ExtractError> {
        self.extract_detailed(waveform).map(|e| e.fingerprint)
    }

    /// Extract a fingerprint and report which analyzer steps fell back
    pub fn extract_detailed(&self, waveform: &Waveform) -> Result<Extraction, ExtractError> {
        validate(waveform)?;

        let duration = waveform.duration_secs();
        let analysis = self.analyzer.analyze(waveform);
        let mut degradations = Vec::new();

        let tempo = match analysis.tempo {
            Ok(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
            Ok(bpm) => {
                log::warn!("Analyzer returned unusable tempo {}, using default", bpm);
                degradations.push(Degradation::TempoDefaulted);
                self.config.default_tempo
            }
            Err(e) => {
                log::warn!("Tempo estimation failed ({}), using default", e);
                degradations.push(Degradation::TempoDefaulted);
                self.config.default_tempo
            }
        };

        let pitch_track = match analysis.pitch_track {
            Ok(track) => track,
            Err(e) => {
                log::warn!("Pitch tracking failed ({}), using unvoiced track", e);
                degradations.push(Degradation::PitchTrackSubstituted);
                PitchTrack::flat(duration, self.config.fallback_pitch_frames)
            }
        };

        let onsets = match analysis.onsets {
            Ok(onsets) => sanitize_onsets(onsets),
            Err(e) => {
                log::warn!("Onset detection failed ({}), using evenly spaced onsets", e);
                degradations.push(Degradation::OnsetsSynthesized);
                synthetic_onsets(duration, self.config.fallback_max_onsets)
            }
        };

        let boundaries = segment_boundaries(&onsets, duration, pitch_track.len());
        let notes = segment_notes(&pitch_track, &boundaries);
        let relative_pitches = relative_pitches(&notes, self.config.max_interval);

        log::debug!(
            "Extracted {:.2}s: tempo {:.1}, {}/{} voiced frames, {} onsets, {} segments, {} intervals",
            duration,
            tempo,
            pitch_track.voiced_count(),
            pitch_track.len(),
            onsets.len(),
            notes.len(),
            relative_pitches.len()
        );

        Ok(Extraction {
            fingerprint: Fingerprint::new(tempo, relative_pitches, duration, onsets.len()),
            degradations,
        })
    }
}

fn validate(waveform: &Waveform) -> Result<(), ExtractError> {
    if waveform.sample_rate == 0 {
        return Err(ExtractError::ZeroSampleRate);
    }
    if let Some(index) = waveform.samples.iter().position(|s| !s.is_finite()) {
        return Err(ExtractError::NonFiniteSample { index });
    }
    Ok(())
}

/// Drop invalid timestamps and restore strict ordering
fn sanitize_onsets(mut onsets: Vec<f64>) -> Vec<f64> {
    let before = onsets.len();
    onsets.retain(|t| t.is_finite() && *t >= 0.0);
    onsets.sort_by(|a, b| a.total_cmp(b));
    onsets.dedup();
    if onsets.len() != before {
        log::debug!("Discarded {} invalid onsets", before - onsets.len());
    }
    onsets
}

/// At most `max_onsets` onsets evenly spaced over `[0, duration]`, one per
/// whole second of audio
pub fn synthetic_onsets(duration: f64, max_onsets: usize) -> Vec<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let count = max_onsets.min(duration.floor() as usize);
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = duration / (count - 1) as f64;
            (0..count).map(|i| i as f64 * step).collect()
        }
    }
}

/// Frame indices delimiting note segments.
///
/// Each onset maps to `round(t / duration * total_frames)`. Frame 0 is
/// prepended unless the first onset already lands there, and
/// `total_frames` closes the last segment, so every consecutive pair of
/// the result is one segment.
pub fn segment_boundaries(onsets: &[f64], duration: f64, total_frames: usize) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(onsets.len() + 2);

    if duration > 0.0 {
        boundaries.extend(onsets.iter().map(|&t| {
            let frame = (t / duration * total_frames as f64).round();
            (frame.max(0.0) as usize).min(total_frames)
        }));
    }

    if boundaries.first().map_or(true, |&first| first > 0) {
        boundaries.insert(0, 0);
    }
    boundaries.push(total_frames);

    boundaries
}

/// Piano key of the mean voiced frequency of each segment, 0 if unvoiced
pub fn segment_notes(pitch_track: &PitchTrack, boundaries: &[usize]) -> Vec<i32> {
    boundaries
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            if end <= start {
                return 0;
            }

            let (sum, count) = pitch_track
                .frequencies(start, end)
                .filter(|&f| f > 0.0)
                .fold((0.0, 0usize), |(sum, count), f| (sum + f, count + 1));

            if count == 0 {
                0
            } else {
                note_number(sum / count as f64)
            }
        })
        .collect()
}

/// Key on an 88-key piano (A4 = 49), or 0 outside the keyboard
pub fn note_number(frequency: f64) -> i32 {
    if !frequency.is_finite() || frequency <= 0.0 {
        return 0;
    }
    let key = (12.0 * (frequency / A4_HZ).log2() + A4_KEY).round() as i32;
    if (LOWEST_KEY..=HIGHEST_KEY).contains(&key) {
        key
    } else {
        0
    }
}

/// Steps between adjacent notes, skipping repeats and jumps of
/// `max_interval` semitones or more
pub fn relative_pitches(notes: &[i32], max_interval: i32) -> Vec<i32> {
    notes
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|&delta| delta != 0 && delta.abs() < max_interval)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, PitchFrame};
    use std::f32::consts::PI;

    const SR: u32 = 22050;

    fn tone(freq: f32, secs: f32) -> Vec<f32> {
        let n = (secs * SR as f32) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn two_tones() -> Waveform {
        let mut samples = tone(440.0, 1.0);
        samples.extend(tone(493.88, 1.0));
        Waveform::new(samples, SR)
    }

    /// Real pitch tracking with onsets fixed by the test
    struct FixedOnsets {
        inner: SpectralAnalyzer,
        onsets: Vec<f64>,
    }

    impl SignalAnalyzer for FixedOnsets {
        fn estimate_tempo(&self, _: &Waveform) -> Result<f64, AnalysisError> {
            Ok(100.0)
        }
        fn pitch_track(&self, waveform: &Waveform) -> Result<PitchTrack, AnalysisError> {
            self.inner.pitch_track(waveform)
        }
        fn detect_onsets(&self, _: &Waveform) -> Result<Vec<f64>, AnalysisError> {
            Ok(self.onsets.clone())
        }
    }

    struct BrokenAnalyzer;

    impl SignalAnalyzer for BrokenAnalyzer {
        fn estimate_tempo(&self, _: &Waveform) -> Result<f64, AnalysisError> {
            Err(AnalysisError::NoPeriodicity)
        }
        fn pitch_track(&self, _: &Waveform) -> Result<PitchTrack, AnalysisError> {
            Err(AnalysisError::InvalidSampleRate)
        }
        fn detect_onsets(&self, _: &Waveform) -> Result<Vec<f64>, AnalysisError> {
            Err(AnalysisError::InvalidSampleRate)
        }
    }

    fn extractor_with_onsets(onsets: Vec<f64>) -> FingerprintExtractor<FixedOnsets> {
        let config = HumConfig::default();
        let analyzer = FixedOnsets {
            inner: SpectralAnalyzer::new(&config),
            onsets,
        };
        FingerprintExtractor::with_analyzer(analyzer, &config)
    }

    #[test]
    fn test_note_numbers() {
        assert_eq!(note_number(440.0), 49);
        assert_eq!(note_number(493.88), 51);
        assert_eq!(note_number(261.63), 40);
        assert_eq!(note_number(27.5), 1);
        assert_eq!(note_number(4186.0), 88);
        assert_eq!(note_number(20.0), 0);
        assert_eq!(note_number(5000.0), 0);
        assert_eq!(note_number(0.0), 0);
        assert_eq!(note_number(f64::NAN), 0);
    }

    #[test]
    fn test_relative_pitches_drop_repeats_and_jumps() {
        let notes = [49, 51, 51, 49, 0, 60, 39, 60, 81];
        // 60 -> 39 is -21 (kept), 39 -> 60 is +21 (kept), 60 -> 81 is +21 (kept)
        assert_eq!(relative_pitches(&notes, 22), vec![2, -2, -21, 21, 21]);
        assert_eq!(relative_pitches(&[40, 62], 22), Vec::<i32>::new());
        assert!(relative_pitches(&[49], 22).is_empty());
        assert!(relative_pitches(&[], 22).is_empty());
    }

    #[test]
    fn test_boundaries_add_leading_and_trailing_frames() {
        // 2 s of audio, 87 frames: 1 s lands on round(43.5) = 44
        assert_eq!(segment_boundaries(&[1.0], 2.0, 87), vec![0, 44, 87]);
        assert_eq!(segment_boundaries(&[0.0, 1.0], 2.0, 87), vec![0, 44, 87]);
        assert_eq!(segment_boundaries(&[], 2.0, 87), vec![0, 87]);
        assert_eq!(segment_boundaries(&[0.5, 5.0], 2.0, 87), vec![0, 22, 87, 87]);
        assert_eq!(segment_boundaries(&[1.0], 0.0, 0), vec![0, 0]);
    }

    #[test]
    fn test_segment_notes_average_voiced_frames() {
        let mut frames: Vec<PitchFrame> = (0..10)
            .map(|i| PitchFrame {
                time: i as f64 * 0.1,
                frequency: if i < 5 { 440.0 } else { 523.25 },
            })
            .collect();
        // Unvoiced frames do not pull the mean down
        frames[1].frequency = 0.0;
        frames[7].frequency = 0.0;
        let track = PitchTrack::new(frames);

        assert_eq!(segment_notes(&track, &[0, 5, 10]), vec![49, 52]);
        // Empty and fully unvoiced segments quantise to 0
        assert_eq!(segment_notes(&track, &[0, 0, 2]), vec![0, 49]);
        assert_eq!(segment_notes(&PitchTrack::flat(1.0, 10), &[0, 10]), vec![0]);
    }

    #[test]
    fn test_synthetic_onsets() {
        assert_eq!(synthetic_onsets(3.5, 10), vec![0.0, 1.75, 3.5]);
        assert_eq!(synthetic_onsets(1.2, 10), vec![0.0]);
        assert!(synthetic_onsets(0.5, 10).is_empty());
        let long = synthetic_onsets(30.0, 10);
        assert_eq!(long.len(), 10);
        assert!((long[9] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_whole_step_with_onset_at_boundary() {
        let fingerprint = extractor_with_onsets(vec![1.0]).extract(&two_tones()).unwrap();
        assert!(fingerprint.relative_pitches.contains(&2), "{:?}", fingerprint);
        assert_eq!(fingerprint.onset_count, 1);
        assert_eq!(fingerprint.tempo, 100.0);
    }

    #[test]
    fn test_whole_step_with_start_and_boundary_onsets() {
        let fingerprint = extractor_with_onsets(vec![0.0, 1.0]).extract(&two_tones()).unwrap();
        assert_eq!(fingerprint.relative_pitches, vec![2]);
        assert_eq!(fingerprint.pitch_count, 1);
        assert!((fingerprint.duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_whole_step_with_spectral_analyzer() {
        let extractor = FingerprintExtractor::new(&HumConfig::default());
        let extraction = extractor.extract_detailed(&two_tones()).unwrap();
        let fingerprint = extraction.fingerprint;

        assert!(fingerprint.relative_pitches.contains(&2), "{:?}", fingerprint);
        assert!(fingerprint.onset_count >= 1);
        assert!(!extraction.degradations.contains(&Degradation::PitchTrackSubstituted));
        assert!(!extraction.degradations.contains(&Degradation::OnsetsSynthesized));
    }

    #[test]
    fn test_silence_yields_empty_fingerprint() {
        let extractor = FingerprintExtractor::new(&HumConfig::default());
        let extraction = extractor
            .extract_detailed(&Waveform::new(vec![0.0; 2 * SR as usize], SR))
            .unwrap();

        assert!(extraction.fingerprint.is_empty());
        assert_eq!(extraction.fingerprint.pitch_count, 0);
        assert_eq!(extraction.fingerprint.tempo, 120.0);
        assert!(extraction.degradations.contains(&Degradation::TempoDefaulted));
    }

    #[test]
    fn test_sustained_note_yields_empty_fingerprint() {
        let extractor = extractor_with_onsets(vec![0.0, 0.5, 1.0, 1.5]);
        let fingerprint = extractor.extract(&Waveform::new(tone(440.0, 2.0), SR)).unwrap();
        assert!(fingerprint.is_empty());
        assert_eq!(fingerprint.onset_count, 4);
    }

    #[test]
    fn test_broken_analyzer_degrades_instead_of_failing() {
        let config = HumConfig::default();
        let extractor = FingerprintExtractor::with_analyzer(BrokenAnalyzer, &config);
        let extraction = extractor.extract_detailed(&two_tones()).unwrap();

        assert_eq!(
            extraction.degradations,
            vec![
                Degradation::TempoDefaulted,
                Degradation::PitchTrackSubstituted,
                Degradation::OnsetsSynthesized,
            ]
        );
        assert_eq!(extraction.fingerprint.tempo, config.default_tempo);
        assert!(extraction.fingerprint.is_empty());
        assert_eq!(extraction.fingerprint.onset_count, 2);
    }

    #[test]
    fn test_empty_waveform_is_not_an_error() {
        let extractor = FingerprintExtractor::new(&HumConfig::default());
        let fingerprint = extractor.extract(&Waveform::new(Vec::new(), SR)).unwrap();
        assert!(fingerprint.is_empty());
        assert_eq!(fingerprint.duration, 0.0);
        assert_eq!(fingerprint.onset_count, 0);
    }

    #[test]
    fn test_structural_faults_are_errors() {
        let extractor = FingerprintExtractor::new(&HumConfig::default());
        assert_eq!(
            extractor.extract(&Waveform::new(vec![0.0; 10], 0)),
            Err(ExtractError::ZeroSampleRate)
        );
        assert_eq!(
            extractor.extract(&Waveform::new(vec![0.0, f32::NAN, 0.0], SR)),
            Err(ExtractError::NonFiniteSample { index: 1 })
        );
    }

    #[test]
    fn test_unsorted_analyzer_onsets_are_repaired() {
        let fingerprint = extractor_with_onsets(vec![1.0, f64::NAN, 0.0, 1.0])
            .extract(&two_tones())
            .unwrap();
        assert_eq!(fingerprint.onset_count, 2);
        assert_eq!(fingerprint.relative_pitches, vec![2]);
    }

    #[test]
    fn test_deserialize_defaults_and_recounts() {
        let fingerprint: Fingerprint =
            serde_json::from_str(r#"{"relative_pitches": [2, -1, 3], "pitch_count": 99}"#).unwrap();
        assert_eq!(fingerprint.tempo, 120.0);
        assert_eq!(fingerprint.pitch_count, 3);
    }
}
