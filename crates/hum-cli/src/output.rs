//! JSON output formatting

use hum_core::{CatalogEntry, Fingerprint, MatchResult};
use serde::Serialize;

/// Summary of the query fingerprint shown next to the matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFeatures {
    pub tempo: f64,
    pub duration: f64,
    pub pitch_count: usize,
    pub onset_count: usize,
}

impl From<&Fingerprint> for QueryFeatures {
    fn from(fingerprint: &Fingerprint) -> Self {
        Self {
            tempo: fingerprint.tempo,
            duration: fingerprint.duration,
            pitch_count: fingerprint.pitch_count,
            onset_count: fingerprint.onset_count,
        }
    }
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    success: bool,
    features: QueryFeatures,
    matches: &'a [MatchResult],
}

#[derive(Serialize)]
struct FailureOutput<'a> {
    success: bool,
    error: &'a str,
}

#[derive(Serialize)]
struct SongSummary<'a> {
    name: &'a str,
    path: &'a str,
    tempo: f64,
    pitch_count: usize,
}

#[derive(Serialize)]
struct SongsOutput<'a> {
    songs: Vec<SongSummary<'a>>,
}

/// Render ranked matches for a query
pub fn match_json(query: &Fingerprint, matches: &[MatchResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&MatchOutput {
        success: true,
        features: QueryFeatures::from(query),
        matches,
    })
}

/// Render a failed request
pub fn failure_json(error: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&FailureOutput {
        success: false,
        error,
    })
}

/// Render the catalog song list
pub fn songs_json(entries: &[CatalogEntry]) -> serde_json::Result<String> {
    let songs = entries
        .iter()
        .map(|entry| SongSummary {
            name: &entry.name,
            path: &entry.path,
            tempo: entry.fingerprint.tempo,
            pitch_count: entry.fingerprint.pitch_count,
        })
        .collect();
    serde_json::to_string_pretty(&SongsOutput { songs })
}

/// Print any serializable value as JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print an already rendered document
pub fn print_rendered(rendered: serde_json::Result<String>) {
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_match_json_shape() {
        let query = Fingerprint::new(98.5, vec![2, -2, 3], 6.0, 4);
        let matches = vec![MatchResult {
            name: "Twinkle Twinkle".to_string(),
            path: "songs/twinkle_twinkle.mp3".to_string(),
            similarity: 87.3,
            tempo: 100.0,
            pitch_count: 12,
        }];

        let value: Value = serde_json::from_str(&match_json(&query, &matches).unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["features"]["pitch_count"], 3);
        assert_eq!(value["features"]["onset_count"], 4);
        assert_eq!(value["matches"][0]["name"], "Twinkle Twinkle");
        assert_eq!(value["matches"][0]["similarity"], 87.3);
    }

    #[test]
    fn test_failure_json() {
        let value: Value = serde_json::from_str(&failure_json("No songs in catalog").unwrap()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "No songs in catalog");
    }

    #[test]
    fn test_songs_json() {
        let entries = vec![CatalogEntry::new(
            "Ode To Joy",
            "songs/ode_to_joy.mp3",
            Fingerprint::new(110.0, vec![0, 1, 2], 30.0, 9),
        )];
        let value: Value = serde_json::from_str(&songs_json(&entries).unwrap()).unwrap();
        assert_eq!(value["songs"][0]["path"], "songs/ode_to_joy.mp3");
        assert_eq!(value["songs"][0]["pitch_count"], 3);
        assert!(value["songs"][0].get("relative_pitches").is_none());
    }
}
