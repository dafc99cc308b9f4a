//! Audio decoding for multiple formats

use super::{resample_to_target, AudioFormat, Waveform};
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded audio data, interleaved when `channels > 1`
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
}

impl AudioData {
    pub(crate) fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let frames_per_sec = (sample_rate as u64 * channels.max(1) as u64).max(1);
        let duration_ms = (samples.len() as u64 * 1000 / frames_per_sec) as u32;
        Self {
            samples,
            sample_rate,
            channels,
            duration_ms,
        }
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// Consume into the mono waveform handed to the extractor
    pub fn into_waveform(self) -> Waveform {
        if self.channels <= 1 {
            return Waveform::new(self.samples, self.sample_rate);
        }
        let mono = self.to_mono();
        Waveform::new(mono, self.sample_rate)
    }
}

/// Decode an audio file to mono at the target sample rate
pub fn decode_audio(path: &Path, target_sample_rate: u32) -> Result<AudioData> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {}", path.display());
    }

    let mut audio_data = match AudioFormat::from_path(path) {
        AudioFormat::Wav => decode_wav(path)?,
        AudioFormat::Mp3 => decode_mp3(path)?,
        AudioFormat::Flac => decode_flac(path)?,
        AudioFormat::Ogg => decode_ogg(path)?,
        AudioFormat::M4a | AudioFormat::Webm | AudioFormat::Unknown => {
            // Let Symphonia probe the container
            super::decode_with_symphonia(path)?
        }
    };

    if audio_data.sample_rate == 0 {
        anyhow::bail!("Decoded audio has no sample rate: {}", path.display());
    }

    if audio_data.channels > 1 {
        audio_data.samples = audio_data.to_mono();
        audio_data.channels = 1;
    }

    if audio_data.sample_rate != target_sample_rate {
        log::debug!(
            "Resampling {} from {} Hz to {} Hz",
            path.display(),
            audio_data.sample_rate,
            target_sample_rate
        );
        let resampled =
            resample_to_target(&audio_data.samples, audio_data.sample_rate, target_sample_rate)?;
        audio_data = AudioData::new(resampled, target_sample_rate, 1);
    }

    Ok(audio_data)
}

/// Decode WAV file
fn decode_wav(path: &Path) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(AudioData::new(samples, spec.sample_rate, spec.channels))
}

/// Decode MP3 file
fn decode_mp3(path: &Path) -> Result<AudioData> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MP3 file: {}", path.display()))?;

    let mut decoder = minimp3::Decoder::new(&data[..]);
    let mut samples = Vec::new();
    let mut sample_rate = 0;
    let mut channels = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                samples.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => anyhow::bail!("MP3 decode error in {}: {}", path.display(), e),
        }
    }

    Ok(AudioData::new(samples, sample_rate, channels))
}

/// Decode FLAC file
fn decode_flac(path: &Path) -> Result<AudioData> {
    let mut reader = claxon::FlacReader::open(path)
        .with_context(|| format!("Failed to open FLAC file: {}", path.display()))?;

    let info = reader.streaminfo();
    let max_val = (1i64 << (info.bits_per_sample - 1)) as f32;
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AudioData::new(samples, info.sample_rate, info.channels as u16))
}

/// Decode OGG Vorbis file
fn decode_ogg(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open OGG file: {}", path.display()))?;

    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;

    let mut samples = Vec::new();
    while let Some(packet) = reader.read_dec_packet_itl()? {
        samples.extend(packet.iter().map(|&s| s as f32 / 32768.0));
    }

    Ok(AudioData::new(samples, sample_rate, channels))
}
