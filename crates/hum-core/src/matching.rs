//! Ranking a query fingerprint against the catalog

use crate::catalog::CatalogEntry;
use crate::config::HumConfig;
use crate::fingerprint::Fingerprint;
use crate::similarity::SimilarityScorer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Matches returned when the caller does not ask for a count
pub const DEFAULT_TOP_N: usize = 3;

/// One ranked catalog song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Display name of the song
    pub name: String,
    /// Media path relative to the media root
    pub path: String,
    /// Score in `[0, 100]`, rounded to one decimal
    pub similarity: f64,
    /// Tempo of the catalog song
    pub tempo: f64,
    /// Number of intervals in the catalog fingerprint
    pub pitch_count: usize,
}

impl MatchResult {
    fn new(entry: &CatalogEntry, similarity: f64) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            similarity,
            tempo: entry.fingerprint.tempo,
            pitch_count: entry.fingerprint.pitch_count,
        }
    }
}

/// Scores a query against every catalog entry and keeps the best
#[derive(Debug, Clone, Default)]
pub struct CatalogMatcher {
    scorer: SimilarityScorer,
}

impl CatalogMatcher {
    pub fn new(config: &HumConfig) -> Self {
        Self::with_scorer(SimilarityScorer::new(config))
    }

    pub fn with_scorer(scorer: SimilarityScorer) -> Self {
        Self { scorer }
    }

    /// Best `top_n` entries by descending similarity.
    ///
    /// Entries with equal rounded scores keep their catalog order. The
    /// catalog itself is not modified.
    pub fn rank(&self, query: &Fingerprint, catalog: &[CatalogEntry], top_n: usize) -> Vec<MatchResult> {
        if catalog.is_empty() || top_n == 0 {
            return Vec::new();
        }

        // Indexed parallel collect keeps catalog order
        let mut results: Vec<MatchResult> = catalog
            .par_iter()
            .map(|entry| {
                let similarity = round_one_decimal(self.scorer.score(query, &entry.fingerprint));
                MatchResult::new(entry, similarity)
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_n);

        log::debug!(
            "Ranked {} catalog entries, best {:?}",
            catalog.len(),
            results.first().map(|r| (&r.name, r.similarity))
        );

        results
    }
}

/// Rank with the default scoring weights
pub fn rank(query: &Fingerprint, catalog: &[CatalogEntry], top_n: usize) -> Vec<MatchResult> {
    CatalogMatcher::default().rank(query, catalog, top_n)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
