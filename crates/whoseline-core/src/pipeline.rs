//! Sequential per-line synthesis and concatenation
//!
//! Each merged dialog entry is synthesized, decoded and appended to one
//! [`CombinedTrack`] strictly in order; the finished track is exported once.
//! The first failure aborts the whole run and nothing is exported.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::audio::{decode, AudioEncoder, CombinedTrack};
use crate::config::PipelineConfig;
use crate::dialog::{Dialog, DialogEntry};
use crate::error::{Error, Result};
use crate::mapping::VoiceMap;
use crate::provider::{SpeechSynthesizer, SynthesisRequest, SynthesizedAudio};

/// Where the pipeline writes its artifacts
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_path: PathBuf,
    pub scratch_dir: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            scratch_dir: None,
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            output_path: config.output_path.clone(),
            scratch_dir: config.scratch_dir.clone(),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub lines: usize,
    pub duration: Duration,
    pub output: PathBuf,
}

/// Hooks for rendering progress; all methods default to doing nothing
pub trait ProgressObserver {
    /// `index` is 1-based
    fn line_started(&self, _index: usize, _total: usize, _voice: &str, _entry: &DialogEntry) {}

    /// Called once the line's audio is part of the track
    fn line_finished(&self, _index: usize, _total: usize, _duration: Duration) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Per-line synthesis pipeline bound to one provider and voice mapping
pub struct Pipeline<'a, S: SpeechSynthesizer + ?Sized> {
    synthesizer: &'a S,
    voices: &'a VoiceMap,
    options: PipelineOptions,
}

impl<'a, S: SpeechSynthesizer + ?Sized> Pipeline<'a, S> {
    pub fn new(synthesizer: &'a S, voices: &'a VoiceMap, options: PipelineOptions) -> Self {
        Self {
            synthesizer,
            voices,
            options,
        }
    }

    /// Synthesize `dialog` (expected to be merged already) and export it
    pub async fn run(
        &self,
        dialog: &Dialog,
        progress: &dyn ProgressObserver,
    ) -> Result<PipelineReport> {
        let track = self.synthesize_track(dialog, progress).await?;

        let output = self.options.output_path.clone();
        AudioEncoder::for_track(&track).export(&track, &output)?;

        let duration = track.duration();
        info!(
            "Conversation audio, duration {:.2}s, saved as {:?}",
            duration.as_secs_f64(),
            output
        );

        Ok(PipelineReport {
            lines: track.segment_count(),
            duration,
            output,
        })
    }

    /// Build the combined track without exporting it
    pub async fn synthesize_track(
        &self,
        dialog: &Dialog,
        progress: &dyn ProgressObserver,
    ) -> Result<CombinedTrack> {
        if dialog.is_empty() {
            return Err(Error::ConfigError("dialog has no lines".to_string()));
        }
        self.voices.validate(dialog)?;

        if let Some(dir) = &self.options.scratch_dir {
            std::fs::create_dir_all(dir)?;
        }

        let total = dialog.len();
        let mut track = CombinedTrack::new();

        for (idx, entry) in dialog.iter().enumerate() {
            let index = idx + 1;
            let outcome = self
                .synthesize_line(index, total, entry, &mut track, progress)
                .await;
            if let Err(source) = outcome {
                error!("Line {}/{} failed: {}", index, total, source);
                return Err(Error::Aborted {
                    line: index,
                    completed: track.segment_count(),
                    source: Box::new(source),
                });
            }
        }

        Ok(track)
    }

    async fn synthesize_line(
        &self,
        index: usize,
        total: usize,
        entry: &DialogEntry,
        track: &mut CombinedTrack,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        let voice = self.voices.resolve(entry.actor)?;
        debug!(
            "Processing line {}/{}: {} says: \"{}\"",
            index, total, voice, entry.line
        );
        progress.line_started(index, total, voice, entry);

        let request = SynthesisRequest::new(entry.line.clone(), voice);
        let audio = self.synthesizer.synthesize(&request).await?;

        if let Some(dir) = &self.options.scratch_dir {
            write_scratch(dir, index, &audio)?;
        }

        let segment = decode(&audio.data, audio.encoding)?;
        track.append(segment)?;
        let duration = track.segment_durations().last().copied().unwrap_or_default();
        progress.line_finished(index, total, duration);
        Ok(())
    }
}

fn write_scratch(dir: &Path, index: usize, audio: &SynthesizedAudio) -> Result<()> {
    let path = dir.join(format!("line_{}.{}", index, audio.encoding.extension()));
    std::fs::write(&path, &audio.data)?;
    debug!("Wrote raw payload to {:?}", path);
    Ok(())
}

/// Merge `dialog`, then synthesize and export it
pub async fn create_conversation<S: SpeechSynthesizer + ?Sized>(
    synthesizer: &S,
    voices: &VoiceMap,
    dialog: &Dialog,
    options: PipelineOptions,
    progress: &dyn ProgressObserver,
) -> Result<PipelineReport> {
    let merged = dialog.merged();
    debug!("Merged {} entries into {}", dialog.len(), merged.len());
    Pipeline::new(synthesizer, voices, options)
        .run(&merged, progress)
        .await
}
