//! Multi-speaker batch synthesis
//!
//! The merged dialog is truncated, turned into speaker-tagged turns and sent as
//! one long-running request. The provider writes the result to `output_uri`;
//! nothing is decoded locally.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, BatchConfig};
use crate::dialog::Dialog;
use crate::error::{Error, Result};
use crate::mapping::SpeakerTagMap;
use crate::provider::{
    LongAudioSynthesizer, MultiSpeakerRequest, OperationHandle, OperationStatus, Turn,
};

/// Settings for one batch submission
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub voice_name: String,
    pub language_code: String,
    pub output_uri: String,
    pub max_turns: usize,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl BatchOptions {
    /// Options from configuration; the output URI is mandatory
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let batch: &BatchConfig = &config.batch;
        let output_uri = batch
            .output_uri
            .clone()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("batch.output_uri is not set".to_string()))?;

        Ok(Self {
            voice_name: batch.voice_name.clone(),
            language_code: config.google.language_code.clone(),
            output_uri,
            max_turns: batch.max_turns,
            timeout: Duration::from_secs(batch.timeout_secs),
            poll_interval: Duration::from_secs(batch.poll_interval_secs),
        })
    }
}

/// Outcome of a finished batch operation
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub turns: usize,
    pub output_uri: String,
    pub operation: String,
}

/// Build the multi-speaker request for the first `max_turns` entries of an
/// already merged dialog
pub fn build_request(
    dialog: &Dialog,
    tags: &SpeakerTagMap,
    options: &BatchOptions,
) -> Result<MultiSpeakerRequest> {
    let selected = dialog.truncated(options.max_turns);
    if selected.is_empty() {
        return Err(Error::ConfigError("dialog has no lines".to_string()));
    }
    if selected.len() < dialog.len() {
        warn!(
            "Submitting {} of {} merged lines (max_turns = {})",
            selected.len(),
            dialog.len(),
            options.max_turns
        );
    }
    tags.validate(&selected)?;

    let turns = selected
        .iter()
        .map(|entry| -> Result<Turn> {
            Ok(Turn {
                text: entry.line.clone(),
                speaker: tags.resolve(entry.actor)?.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MultiSpeakerRequest {
        turns,
        voice_name: options.voice_name.clone(),
        language_code: options.language_code.clone(),
        output_uri: options.output_uri.clone(),
    })
}

/// Merge, submit and wait for a multi-speaker synthesis
pub async fn synthesize_multispeaker<L: LongAudioSynthesizer + ?Sized>(
    synthesizer: &L,
    dialog: &Dialog,
    tags: &SpeakerTagMap,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let merged = dialog.merged();
    let request = build_request(&merged, tags, options)?;
    let turns = request.turns.len();

    let operation = synthesizer.start(&request).await?;
    info!(
        "Started {} with {} turns, waiting up to {:?}",
        operation.name, turns, options.timeout
    );

    wait_for_completion(synthesizer, &operation, options).await?;

    info!(
        "Finished processing, audio written to {}",
        options.output_uri
    );
    Ok(BatchReport {
        turns,
        output_uri: options.output_uri.clone(),
        operation: operation.name,
    })
}

/// Poll until the operation completes, fails, or `options.timeout` elapses
pub async fn wait_for_completion<L: LongAudioSynthesizer + ?Sized>(
    synthesizer: &L,
    operation: &OperationHandle,
    options: &BatchOptions,
) -> Result<()> {
    tokio::time::timeout(options.timeout, poll_until_done(synthesizer, operation, options))
        .await
        .map_err(|_| Error::OperationTimeout(options.timeout))?
}

async fn poll_until_done<L: LongAudioSynthesizer + ?Sized>(
    synthesizer: &L,
    operation: &OperationHandle,
    options: &BatchOptions,
) -> Result<()> {
    loop {
        match synthesizer.poll(operation).await? {
            OperationStatus::Succeeded => return Ok(()),
            OperationStatus::Failed(message) => return Err(Error::OperationFailed(message)),
            OperationStatus::Running => {
                debug!("{} still running", operation.name);
                tokio::time::sleep(options.poll_interval).await;
            }
        }
    }
}
