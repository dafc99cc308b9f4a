//! Tests for catalog ranking

use super::*;
use approx::assert_relative_eq;

fn entry(name: &str, tempo: f64, pitches: &[i32]) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        path: format!("songs/{}.mp3", name.to_lowercase()),
        fingerprint: Fingerprint::new(tempo, pitches.to_vec(), 30.0, pitches.len() + 1),
    }
}

fn query() -> Fingerprint {
    Fingerprint::new(120.0, vec![1, 2, 3, 4], 5.0, 5)
}

#[test]
fn test_rank_orders_by_similarity() {
    let catalog = vec![
        entry("Far", 240.0, &[4, 3, 2, 1]),
        entry("Exact", 120.0, &[1, 2, 3, 4]),
        entry("Close", 150.0, &[1, 2, 3, 4]),
    ];

    let results = rank(&query(), &catalog, 3);
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(names, vec!["Exact", "Close", "Far"]);
    assert_relative_eq!(results[0].similarity, 100.0);
    assert_relative_eq!(results[1].similarity, 92.0);
    assert_relative_eq!(results[2].similarity, 20.0);
}

#[test]
fn test_ties_keep_catalog_order() {
    // Constant sequences score pitch 0.5, halved tempo scores 0.5: 50.0
    // Matching sequence at halved tempo: 0.6 + 0.2 = 80.0
    let catalog = vec![
        entry("A", 240.0, &[2, 2, 2, 2]),
        entry("B", 240.0, &[1, 2, 3, 4]),
        entry("C", 240.0, &[5, 5, 5]),
    ];

    let results = rank(&query(), &catalog, 3);
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(names, vec!["B", "A", "C"]);
    assert_relative_eq!(results[0].similarity, 80.0);
    assert_relative_eq!(results[1].similarity, 50.0);
    assert_relative_eq!(results[2].similarity, 50.0);
}

#[test]
fn test_rank_truncates_to_top_n() {
    let catalog: Vec<CatalogEntry> = (0..10)
        .map(|i| entry(&format!("Song {}", i), 100.0 + i as f64 * 5.0, &[1, -1, 2]))
        .collect();

    assert_eq!(rank(&query(), &catalog, DEFAULT_TOP_N).len(), 3);
    assert_eq!(rank(&query(), &catalog, 50).len(), 10);
    assert!(rank(&query(), &catalog, 0).is_empty());
}

#[test]
fn test_empty_catalog() {
    assert!(rank(&query(), &[], 3).is_empty());
}

#[test]
fn test_empty_query_scores_zero_everywhere() {
    let catalog = vec![entry("A", 120.0, &[1, 2]), entry("B", 120.0, &[3, 1])];
    let empty = Fingerprint::new(120.0, Vec::new(), 1.0, 0);

    let results = rank(&empty, &catalog, 3);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.similarity == 0.0));
    assert_eq!(results[0].name, "A");
}

#[test]
fn test_result_carries_catalog_fields() {
    let catalog = vec![entry("Twinkle", 96.5, &[0, 7, 0, 2, 0, -2])];
    let result = &rank(&query(), &catalog, 1)[0];

    assert_eq!(result.path, "songs/twinkle.mp3");
    assert_eq!(result.tempo, 96.5);
    assert_eq!(result.pitch_count, 6);
}

#[test]
fn test_scores_are_rounded_to_one_decimal() {
    let catalog = vec![entry("Odd", 133.0, &[1, 3, 2, 4])];
    let similarity = rank(&query(), &catalog, 1)[0].similarity;
    assert_relative_eq!(similarity * 10.0, (similarity * 10.0).round(), epsilon = 1e-9);
}

#[test]
fn test_custom_weights() {
    let config = HumConfig {
        pitch_weight: 0.0,
        tempo_weight: 1.0,
        ..HumConfig::default()
    };
    let catalog = vec![entry("Reversed", 120.0, &[4, 3, 2, 1])];
    let results = CatalogMatcher::new(&config).rank(&query(), &catalog, 1);
    assert_relative_eq!(results[0].similarity, 100.0);
}
