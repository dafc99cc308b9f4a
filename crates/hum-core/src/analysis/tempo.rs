//! Tempo estimation from the onset envelope
//!
//! The mean-removed envelope is autocorrelated over the lags that
//! correspond to the configured BPM range. Each lag's correlation is
//! summed with its neighbours, so a period falling between two frames is
//! not split in half, and weighted by a log-tempo prior centred on
//! 120 BPM. The winning lag, refined by parabolic interpolation, is the
//! beat period.

use super::AnalysisError;
use crate::config::HumConfig;

/// Shortest envelope worth autocorrelating (about 1.5 s at 22050/512)
const MIN_ENVELOPE_FRAMES: usize = 64;
/// Autocorrelation peaks weaker than this are treated as noise
const MIN_CORRELATION: f64 = 0.05;
/// Centre and spread (in octaves) of the tempo prior
const PRIOR_BPM: f64 = 120.0;
const PRIOR_STD_OCTAVES: f64 = 1.0;

/// Estimate beats per minute from an onset envelope
pub fn estimate_tempo(
    envelope: &[f32],
    frame_duration: f64,
    config: &HumConfig,
) -> Result<f64, AnalysisError> {
    if envelope.len() < MIN_ENVELOPE_FRAMES {
        return Err(AnalysisError::EnvelopeTooShort {
            frames: envelope.len(),
            required: MIN_ENVELOPE_FRAMES,
        });
    }

    let min_lag = (60.0 / (config.max_tempo as f64 * frame_duration)).floor().max(1.0) as usize;
    let max_lag = ((60.0 / (config.min_tempo as f64 * frame_duration)).ceil() as usize)
        .min(envelope.len() / 2);
    if min_lag >= max_lag {
        return Err(AnalysisError::EnvelopeTooShort {
            frames: envelope.len(),
            required: 2 * min_lag + 2,
        });
    }

    let mean = envelope.iter().map(|&x| x as f64).sum::<f64>() / envelope.len() as f64;
    let centered: Vec<f64> = envelope.iter().map(|&x| x as f64 - mean).collect();

    let energy: f64 = centered.iter().map(|x| x * x).sum();
    if energy < 1e-10 {
        return Err(AnalysisError::NoPeriodicity);
    }

    let corr_at = |lag: usize| -> f64 {
        centered[..centered.len() - lag]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / energy
    };
    let smoothed_at = |lag: usize| -> f64 {
        corr_at(lag.saturating_sub(1).max(1)) + corr_at(lag) + corr_at(lag + 1)
    };
    let prior = |lag: usize| -> f64 {
        let bpm = 60.0 / (lag as f64 * frame_duration);
        let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_STD_OCTAVES;
        (-0.5 * octaves * octaves).exp()
    };

    let (best_lag, _) = (min_lag..=max_lag)
        .map(|lag| (lag, smoothed_at(lag) * prior(lag)))
        .fold((min_lag, f64::NEG_INFINITY), |best, cand| {
            if cand.1 > best.1 {
                cand
            } else {
                best
            }
        });

    let best_corr = smoothed_at(best_lag);
    if best_corr < MIN_CORRELATION {
        return Err(AnalysisError::NoPeriodicity);
    }

    let refined_lag = if best_lag > min_lag && best_lag < max_lag {
        let prev = smoothed_at(best_lag - 1);
        let next = smoothed_at(best_lag + 1);
        let denom = prev - 2.0 * best_corr + next;
        if denom.abs() > 1e-10 {
            best_lag as f64 + (0.5 * (prev - next) / denom).clamp(-0.5, 0.5)
        } else {
            best_lag as f64
        }
    } else {
        best_lag as f64
    };

    let bpm = 60.0 / (refined_lag * frame_duration);

    // Octave ambiguity: prefer half tempo when its period is nearly as strong
    if bpm > 160.0 {
        let half_lag = (refined_lag * 2.0).round() as usize;
        if half_lag <= max_lag && smoothed_at(half_lag) > best_corr * 0.6 {
            log::trace!("Halving tempo {:.1} -> {:.1}", bpm, bpm / 2.0);
            return Ok(bpm / 2.0);
        }
    }

    Ok(bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 512.0 / 22050.0;

    /// Impulse train with one pulse every `period` seconds
    fn pulses(period: f64, secs: f64) -> Vec<f32> {
        let frames = (secs / FRAME) as usize;
        let step = period / FRAME;
        let mut envelope = vec![0.0f32; frames];
        let mut t: f64 = 0.0;
        while (t.round() as usize) < frames {
            envelope[t.round() as usize] = 1.0;
            t += step;
        }
        envelope
    }

    #[test]
    fn test_recovers_regular_pulse_tempo() {
        let config = HumConfig::default();
        let bpm = estimate_tempo(&pulses(0.5, 20.0), FRAME, &config).unwrap();
        assert!((bpm - 120.0).abs() < 4.0, "estimated {}", bpm);
    }

    #[test]
    fn test_slow_pulse_tempo() {
        let config = HumConfig::default();
        let bpm = estimate_tempo(&pulses(0.8, 20.0), FRAME, &config).unwrap();
        assert!((bpm - 75.0).abs() < 3.0, "estimated {}", bpm);
    }

    #[test]
    fn test_short_envelope_fails() {
        let config = HumConfig::default();
        let result = estimate_tempo(&[1.0; 10], FRAME, &config);
        assert!(matches!(result, Err(AnalysisError::EnvelopeTooShort { .. })));
    }

    #[test]
    fn test_flat_envelope_has_no_periodicity() {
        let config = HumConfig::default();
        let result = estimate_tempo(&[0.0; 500], FRAME, &config);
        assert_eq!(result, Err(AnalysisError::NoPeriodicity));
    }
}
