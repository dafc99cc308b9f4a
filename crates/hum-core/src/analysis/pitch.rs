//! Dominant pitch tracking
//!
//! Per frame, spectral peaks inside the configured band are located,
//! refined by parabolic interpolation, and the single strongest one is
//! kept. Only the argmax matters downstream; weaker candidates are dropped.

use crate::config::HumConfig;
use crate::transform::Spectrogram;

/// One analysis frame of the pitch track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame centre in seconds
    pub time: f64,
    /// Dominant frequency in Hz, 0 when no pitch was found
    pub frequency: f64,
}

/// Ordered per-frame pitch estimates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    frames: Vec<PitchFrame>,
}

impl PitchTrack {
    pub fn new(frames: Vec<PitchFrame>) -> Self {
        Self { frames }
    }

    /// All-zero track of `num_frames` frames evenly spanning `[0, duration]`
    pub fn flat(duration: f64, num_frames: usize) -> Self {
        let step = if num_frames > 1 {
            duration / (num_frames - 1) as f64
        } else {
            0.0
        };
        let frames = (0..num_frames)
            .map(|i| PitchFrame {
                time: i as f64 * step,
                frequency: 0.0,
            })
            .collect();
        Self { frames }
    }

    pub fn frames(&self) -> &[PitchFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frequencies for frames `[start, end)`
    pub fn frequencies(&self, start: usize, end: usize) -> impl Iterator<Item = f64> + '_ {
        let end = end.min(self.frames.len());
        let start = start.min(end);
        self.frames[start..end].iter().map(|f| f.frequency)
    }

    /// Number of frames with a detected pitch
    pub fn voiced_count(&self) -> usize {
        self.frames.iter().filter(|f| f.frequency > 0.0).count()
    }
}

/// Track the dominant pitch of every spectrogram frame
pub fn track_pitch(spectrogram: &Spectrogram, config: &HumConfig) -> PitchTrack {
    let lo = spectrogram.frequency_bin(config.min_freq).max(1);
    let hi = spectrogram
        .frequency_bin(config.max_freq)
        .min(spectrogram.num_bins.saturating_sub(2));

    let frames = spectrogram
        .magnitudes
        .iter()
        .enumerate()
        .map(|(t, mags)| PitchFrame {
            time: spectrogram.frame_time(t),
            frequency: dominant_frequency(mags, lo, hi, spectrogram, config),
        })
        .collect();

    PitchTrack::new(frames)
}

fn dominant_frequency(
    mags: &[f32],
    lo: usize,
    hi: usize,
    spectrogram: &Spectrogram,
    config: &HumConfig,
) -> f64 {
    if lo >= hi {
        return 0.0;
    }

    let frame_max = mags.iter().copied().fold(0.0f32, f32::max);
    if frame_max < config.min_magnitude {
        return 0.0;
    }
    let threshold = config.peak_threshold * frame_max;

    let mut best: Option<(f32, f32)> = None; // (magnitude, bin)

    for f in lo..=hi {
        let (prev, curr, next) = (mags[f - 1], mags[f], mags[f + 1]);
        if curr <= threshold || curr <= prev || curr < next {
            continue;
        }

        let (offset, peak_mag) = parabolic_peak(prev, curr, next);
        if best.map_or(true, |(m, _)| peak_mag > m) {
            best = Some((peak_mag, f as f32 + offset));
        }
    }

    match best {
        Some((_, bin)) => spectrogram.bin_frequency(bin) as f64,
        None => 0.0,
    }
}

/// Offset of the interpolated vertex from the centre bin, and its height
fn parabolic_peak(prev: f32, curr: f32, next: f32) -> (f32, f32) {
    let curvature = 2.0 * curr - prev - next;
    if curvature.abs() < f32::EPSILON {
        return (0.0, curr);
    }
    let avg = 0.5 * (next - prev);
    let offset = (avg / curvature).clamp(-0.5, 0.5);
    (offset, curr + 0.5 * avg * offset)
}
