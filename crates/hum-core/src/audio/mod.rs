//! Audio decoding and resampling
//!
//! Turns song files and recorded queries into the mono waveform the
//! extractor consumes. WAV, MP3, FLAC and OGG use dedicated pure Rust
//! decoders; M4A/AAC and anything else go through Symphonia.

mod container;
mod decoder;
mod resample;
mod waveform;

pub use container::decode_with_symphonia;
pub use decoder::{decode_audio, AudioData};
pub use resample::resample_to_target;
pub use waveform::Waveform;

use std::path::Path;

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    // Decoded through Symphonia
    M4a,
    Webm,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") => AudioFormat::Ogg,
            Some("m4a") | Some("mp4") | Some("aac") => AudioFormat::M4a,
            Some("webm") | Some("mkv") => AudioFormat::Webm,
            _ => AudioFormat::Unknown,
        }
    }

    /// Formats accepted when scanning a songs directory
    pub fn is_catalog_source(&self) -> bool {
        matches!(
            self,
            AudioFormat::Wav | AudioFormat::Mp3 | AudioFormat::Flac | AudioFormat::Ogg | AudioFormat::M4a
        )
    }
}
