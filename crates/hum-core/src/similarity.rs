//! Similarity scoring between fingerprints
//!
//! The score blends the Pearson correlation of the relative-pitch
//! sequences with the ratio of the two tempos, scaled to `[0, 100]`.

use crate::config::HumConfig;
use crate::fingerprint::Fingerprint;

/// Pitch component used when either sequence has no spread
const FLAT_SEQUENCE_SIMILARITY: f64 = 0.5;

/// Weighted pitch + tempo scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    pitch_weight: f64,
    tempo_weight: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(&HumConfig::default())
    }
}

impl SimilarityScorer {
    pub fn new(config: &HumConfig) -> Self {
        Self {
            pitch_weight: config.pitch_weight,
            tempo_weight: config.tempo_weight,
        }
    }

    /// Score two fingerprints in `[0, 100]`; symmetric in its arguments.
    ///
    /// A fingerprint without intervals matches nothing and scores 0.
    pub fn score(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        if a.relative_pitches.is_empty() || b.relative_pitches.is_empty() {
            return 0.0;
        }

        let pitch = pitch_similarity(&a.relative_pitches, &b.relative_pitches);
        let tempo = tempo_similarity(a.tempo, b.tempo);
        let combined = 100.0 * (self.pitch_weight * pitch + self.tempo_weight * tempo);

        if combined.is_finite() {
            combined.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Score with the default weights
pub fn score(a: &Fingerprint, b: &Fingerprint) -> f64 {
    SimilarityScorer::default().score(a, b)
}

/// `1 - |a - b| / max(a, b)` in `[0, 1]`; 0 for degenerate tempos
pub fn tempo_similarity(a: f64, b: f64) -> f64 {
    let similarity = 1.0 - (a - b).abs() / a.max(b);
    if similarity.is_finite() {
        similarity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Correlation of the common prefix of two interval sequences.
///
/// Negative correlation counts as no similarity. If either prefix is
/// constant the correlation is undefined and a neutral 0.5 is returned.
pub fn pitch_similarity(a: &[i32], b: &[i32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    match pearson(&a[..n], &b[..n]) {
        Some(r) if r.is_nan() => 0.0,
        Some(r) => r.clamp(0.0, 1.0),
        None => FLAT_SEQUENCE_SIMILARITY,
    }
}

/// Pearson correlation, `None` when either input has zero variance
fn pearson(a: &[i32], b: &[i32]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().map(|&x| x as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|&x| x as f64).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}
