//! Audio resampling using rubato's band-limited sinc interpolation

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio to the target sample rate
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("Cannot resample from {} Hz to {} Hz", from_rate, to_rate);
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .context("Failed to create resampler")?;

    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);

    let mut chunks = samples.chunks_exact(CHUNK_SIZE);
    for chunk in &mut chunks {
        let input: [&[f32]; 1] = [chunk];
        let out = resampler.process(&input[..], None)?;
        output.extend_from_slice(&out[0]);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let input: [&[f32]; 1] = [remainder];
        let out = resampler.process_partial(Some(&input[..]), None)?;
        output.extend_from_slice(&out[0]);
    }

    // Flush the filter tail until the delayed samples are out
    while output.len() < expected_len + delay {
        let out = resampler.process_partial::<&[f32]>(None, None)?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    Ok(output.into_iter().skip(delay).take(expected_len).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample_to_target(&samples, 22050, 22050).unwrap(), samples);
    }

    #[test]
    fn test_downsample_length() {
        let samples = vec![0.0f32; 44100];
        let out = resample_to_target(&samples, 44100, 22050).unwrap();
        assert!((out.len() as i64 - 22050).abs() <= 1);
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(resample_to_target(&[0.5], 0, 22050).is_err());
    }
}
