//! Exporting the combined track as WAV

use hound::{WavSpec, WavWriter};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::segment::CombinedTrack;
use crate::error::{Error, Result};

/// 16-bit PCM WAV writer
pub struct AudioEncoder {
    sample_rate: u32,
    channels: u16,
}

impl AudioEncoder {
    /// Create a new encoder
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Encoder matching the format of a track
    pub fn for_track(track: &CombinedTrack) -> Self {
        Self::new(track.sample_rate(), track.channels())
    }

    /// Encode samples to an in-memory WAV file
    #[cfg(test)]
    pub(crate) fn encode_wav(&self, samples: &[f32]) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.write_wav(&mut buffer, samples)?;
        Ok(buffer.into_inner())
    }

    /// Write a track to `path`, creating parent directories.
    ///
    /// The WAV is written to a temporary file in the same directory and
    /// renamed over `path` only once it is complete.
    pub fn export(&self, track: &CombinedTrack, path: &Path) -> Result<()> {
        if track.is_empty() {
            return Err(Error::AudioError("nothing to export".to_string()));
        }
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let staging = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(staging.as_file());
            self.write_wav(&mut writer, track.samples())?;
            writer.flush()?;
        }
        staging.persist(path).map_err(|e| Error::IoError(e.error))?;

        debug!("Exported {} samples to {:?}", track.samples().len(), path);
        Ok(())
    }

    fn write_wav<W: Write + Seek>(&self, sink: W, samples: &[f32]) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::new(sink, spec)?;
        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            let sample_i16 = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer.write_sample(sample_i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{decode, AudioEncoding, AudioSegment};
    use std::time::Duration;

    #[test]
    fn test_export_writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.wav");

        let mut track = CombinedTrack::new();
        track
            .append(AudioSegment::silence(Duration::from_millis(250), 16000, 1).unwrap())
            .unwrap();
        track
            .append(AudioSegment::silence(Duration::from_millis(750), 16000, 1).unwrap())
            .unwrap();

        AudioEncoder::for_track(&track).export(&track, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let segment = decode(&bytes, AudioEncoding::Wav).unwrap();
        assert_eq!(segment.sample_rate(), 16000);
        assert_eq!(segment.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_export_refuses_empty_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let track = CombinedTrack::new();
        assert!(AudioEncoder::new(24000, 1).export(&track, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_export_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        std::fs::write(&path, b"stale").unwrap();

        let mut track = CombinedTrack::new();
        track
            .append(AudioSegment::silence(Duration::from_millis(100), 8000, 1).unwrap())
            .unwrap();
        AudioEncoder::for_track(&track).export(&track, &path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let segment = decode(&std::fs::read(&path).unwrap(), AudioEncoding::Wav).unwrap();
        assert_eq!(segment.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_failed_export_cleans_up_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the final rename fail
        let path = dir.path().join("out.wav");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let mut track = CombinedTrack::new();
        track
            .append(AudioSegment::silence(Duration::from_millis(10), 8000, 1).unwrap())
            .unwrap();
        let result = AudioEncoder::for_track(&track).export(&track, &path);

        assert!(matches!(result, Err(Error::IoError(_))));
        assert!(path.is_dir());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
