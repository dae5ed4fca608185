//! OpenAI speech providers
//!
//! `OpenAiSpeechProvider` calls the dedicated `/audio/speech` endpoint and
//! receives raw 24 kHz mono PCM. `OpenAiChatAudioProvider` asks an
//! audio-capable chat model to read the line and receives a base64 WAV inside
//! the chat completion; raw `pcm16` is only offered on streamed completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    decode_base64, error_from_response, require_credential, SpeechSynthesizer, SynthesisRequest,
    SynthesizedAudio,
};
use crate::audio::AudioEncoding;
use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

/// Output format of `/audio/speech` when PCM is requested
const OPENAI_PCM: AudioEncoding = AudioEncoding::Pcm16 {
    sample_rate: 24000,
    channels: 1,
};

fn build_client(config: &OpenAiConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// `/audio/speech` request body
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Text-to-speech through the OpenAI speech endpoint
#[derive(Debug, Clone)]
pub struct OpenAiSpeechProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiSpeechProvider {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_credential(&api_key, "OpenAI API key")?;

        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.speech_model.clone(),
            api_key,
        })
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechProvider {
    fn name(&self) -> &str {
        "openai-speech"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        let body = SpeechRequest {
            model: &self.model,
            input: &request.text,
            voice: &request.voice,
            response_format: "pcm",
        };

        let response = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response).await);
        }

        let data = response.bytes().await?;
        debug!("OpenAI speech returned {} bytes", data.len());

        Ok(SynthesizedAudio {
            data,
            encoding: OPENAI_PCM,
        })
    }
}

/// `/chat/completions` request body with audio output
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    modalities: [&'a str; 2],
    audio: ChatAudioOptions<'a>,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatAudioOptions<'a> {
    voice: &'a str,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    audio: Option<ChatAudio>,
}

#[derive(Debug, Deserialize)]
struct ChatAudio {
    data: String,
}

/// Text-to-speech through an audio-capable chat model
#[derive(Debug, Clone)]
pub struct OpenAiChatAudioProvider {
    client: Client,
    base_url: String,
    model: String,
    instructions: String,
    api_key: String,
}

impl OpenAiChatAudioProvider {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_credential(&api_key, "OpenAI API key")?;

        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
            instructions: config.chat_instructions.clone(),
            api_key,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiChatAudioProvider {
    fn name(&self) -> &str {
        "openai-chat"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        let body = ChatRequest {
            model: &self.model,
            modalities: ["text", "audio"],
            audio: ChatAudioOptions {
                voice: &request.voice,
                format: "wav",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &request.text,
                },
            ],
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response).await);
        }

        let completion: ChatResponse = response.json().await?;
        let audio = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.audio)
            .ok_or_else(|| Error::DecodeError("chat completion carried no audio".to_string()))?;

        let data = decode_base64(&audio.data)?;
        debug!("OpenAI chat audio returned {} bytes", data.len());

        Ok(SynthesizedAudio {
            data,
            encoding: AudioEncoding::Wav,
        })
    }
}
