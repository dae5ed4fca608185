//! Speech synthesis providers
//!
//! Two seams separate the pipelines from the cloud services they call:
//! [`SpeechSynthesizer`] turns one line into audio bytes, and
//! [`LongAudioSynthesizer`] starts and polls a multi-speaker job whose result
//! lands in remote storage.

mod google;
mod openai;

pub use google::GoogleTtsProvider;
pub use openai::{OpenAiChatAudioProvider, OpenAiSpeechProvider};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::audio::AudioEncoding;
use crate::error::{Error, Result};

/// One line to synthesize with a resolved voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// Raw provider payload and how to decode it
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Bytes,
    pub encoding: AudioEncoding,
}

/// Per-line text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio>;
}

/// One (text, speaker-tag) unit of a multi-speaker request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub text: String,
    pub speaker: String,
}

/// Whole-dialog request for a long-running multi-speaker synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSpeakerRequest {
    pub turns: Vec<Turn>,
    pub voice_name: String,
    pub language_code: String,
    /// Remote destination the provider writes the result to
    pub output_uri: String,
}

/// Reference to a started long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Running,
    Succeeded,
    Failed(String),
}

/// Batched multi-speaker synthesis run as a provider-side job
#[async_trait]
pub trait LongAudioSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self, request: &MultiSpeakerRequest) -> Result<OperationHandle>;

    async fn poll(&self, operation: &OperationHandle) -> Result<OperationStatus>;
}

/// Error envelope shared by the OpenAI and Google REST APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turn a non-success response into a [`Error::ProviderError`]
async fn error_from_response(provider: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|parsed| parsed.error.message)
        .unwrap_or(body);
    Error::ProviderError(format!("{} returned {}: {}", provider, status, message))
}

fn require_credential(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ConfigError(format!("{} is empty", what)));
    }
    Ok(())
}

fn decode_base64(data: &str) -> Result<Bytes> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map(Bytes::from)
        .map_err(|e| Error::DecodeError(format!("Failed to decode base64 audio: {}", e)))
}
