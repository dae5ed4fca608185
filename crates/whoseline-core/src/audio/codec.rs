//! Decoding provider payloads into audio segments

use hound::WavReader;
use std::io::Cursor;
use tracing::debug;

use super::segment::AudioSegment;
use crate::error::{Error, Result};

/// Encoding of the bytes a provider returns for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// RIFF/WAV container
    Wav,
    /// Headerless little-endian 16-bit PCM, interleaved
    Pcm16 { sample_rate: u32, channels: u16 },
}

impl AudioEncoding {
    /// File extension for scratch copies of the raw payload
    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::Wav => "wav",
            AudioEncoding::Pcm16 { .. } => "pcm",
        }
    }
}

/// Decode a raw payload into an [`AudioSegment`]
pub fn decode(bytes: &[u8], encoding: AudioEncoding) -> Result<AudioSegment> {
    if bytes.is_empty() {
        return Err(Error::DecodeError("empty audio payload".to_string()));
    }

    let segment = match encoding {
        AudioEncoding::Wav => decode_wav(bytes)?,
        AudioEncoding::Pcm16 {
            sample_rate,
            channels,
        } => decode_pcm16(bytes, sample_rate, channels)?,
    };

    debug!(
        "Decoded {} bytes into {} frames at {} Hz",
        bytes.len(),
        segment.frames(),
        segment.sample_rate()
    );
    Ok(segment)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioSegment> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::DecodeError(format!("Failed to parse WAV: {}", e)))?;

    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, hound::Error>>(),
    }
    .map_err(|e| Error::DecodeError(format!("Failed to read WAV samples: {}", e)))?;

    AudioSegment::new(samples, spec.sample_rate, spec.channels)
        .map_err(|e| Error::DecodeError(e.to_string()))
}

fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioSegment> {
    if bytes.len() % 2 != 0 {
        return Err(Error::DecodeError(format!(
            "PCM16 payload has odd length {}",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    AudioSegment::new(samples, sample_rate, channels).map_err(|e| Error::DecodeError(e.to_string()))
}
