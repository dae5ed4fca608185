//! Sample-rate conversion for segments that disagree with the track

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::error::{Error, Result};

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample interleaved samples from `from_rate` to `to_rate`.
///
/// The output holds `ceil(frames * to_rate / from_rate)` frames with the
/// resampler delay removed.
pub fn resample(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if channels == 0 {
        return Err(Error::AudioError("cannot resample zero channels".to_string()));
    }

    let channels = channels as usize;
    let frames = samples.len() / channels;
    let expected = (frames as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        channels,
    )
    .map_err(|e| Error::AudioError(format!("resampler setup failed: {}", e)))?;

    let delay = resampler.output_delay();
    let planar = deinterleave(samples, channels);
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];

    let mut pos = 0;
    while output[0].len() < expected + delay {
        let needed = resampler.input_frames_next();
        let block: Vec<Vec<f32>> = planar
            .iter()
            .map(|channel| {
                let mut chunk = vec![0.0f32; needed];
                if pos < frames {
                    let end = (pos + needed).min(frames);
                    chunk[..end - pos].copy_from_slice(&channel[pos..end]);
                }
                chunk
            })
            .collect();
        pos += needed;

        let processed = resampler
            .process(&block, None)
            .map_err(|e| Error::AudioError(format!("resampling failed: {}", e)))?;
        for (out, chunk) in output.iter_mut().zip(processed) {
            out.extend_from_slice(&chunk);
        }
    }

    for channel in output.iter_mut() {
        channel.drain(..delay);
        channel.truncate(expected);
    }

    debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        frames, from_rate, expected, to_rate
    );
    Ok(interleave(&output))
}

fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    (0..channels)
        .map(|c| samples.iter().skip(c).step_by(channels).copied().collect())
        .collect()
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(Vec::len).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in planar {
            out.push(channel[i]);
        }
    }
    out
}
