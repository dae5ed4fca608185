//! Decoded audio segments and the combined dialog track

use std::time::Duration;
use tracing::debug;

use super::resample::resample;
use crate::error::{Error, Result};

/// Decoded PCM audio with a known duration
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Interleaved samples in [-1.0, 1.0]
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(Error::AudioError(format!(
                "invalid segment format: {} Hz, {} channel(s)",
                sample_rate, channels
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(Error::AudioError(format!(
                "{} samples do not divide into {} channel(s)",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    #[cfg(test)]
    pub(crate) fn silence(duration: Duration, sample_rate: u32, channels: u16) -> Result<Self> {
        let frames = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        frames_duration(self.frames(), self.sample_rate)
    }
}

fn frames_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = frames as u128 * 1_000_000_000 / sample_rate as u128;
    Duration::from_nanos(nanos as u64)
}

/// Accumulator of segments in dialog order
///
/// The first appended segment fixes the track format. Later segments at a
/// different sample rate are resampled; a different channel count is rejected.
#[derive(Debug, Clone, Default)]
pub struct CombinedTrack {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    segment_durations: Vec<Duration>,
}

impl CombinedTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, segment: AudioSegment) -> Result<()> {
        let before = self.samples.len();

        if self.segment_durations.is_empty() {
            self.sample_rate = segment.sample_rate;
            self.channels = segment.channels;
            self.samples = segment.samples;
        } else {
            if segment.channels != self.channels {
                return Err(Error::AudioError(format!(
                    "segment has {} channel(s), track has {}",
                    segment.channels, self.channels
                )));
            }
            if segment.sample_rate == self.sample_rate {
                self.samples.extend_from_slice(&segment.samples);
            } else {
                let converted = resample(
                    &segment.samples,
                    segment.channels,
                    segment.sample_rate,
                    self.sample_rate,
                )?;
                self.samples.extend_from_slice(&converted);
            }
        }

        let frames = (self.samples.len() - before) / self.channels as usize;
        let duration = frames_duration(frames, self.sample_rate);
        self.segment_durations.push(duration);
        debug!(
            "Appended segment {} ({:.3}s), track now {:.3}s",
            self.segment_durations.len(),
            duration.as_secs_f64(),
            self.duration().as_secs_f64()
        );
        Ok(())
    }

    pub fn segment_count(&self) -> usize {
        self.segment_durations.len()
    }

    /// Durations of the appended segments at the track rate, in append order
    pub fn segment_durations(&self) -> &[Duration] {
        &self.segment_durations
    }

    /// Length of the audio held by the track, as it will be exported
    pub fn duration(&self) -> Duration {
        if self.channels == 0 {
            return Duration::ZERO;
        }
        frames_duration(self.samples.len() / self.channels as usize, self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.segment_durations.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
