//! Google Cloud Text-to-Speech over REST (v1beta1)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    decode_base64, error_from_response, require_credential, LongAudioSynthesizer,
    MultiSpeakerRequest, OperationHandle, OperationStatus, SpeechSynthesizer, SynthesisRequest,
    SynthesizedAudio, Turn,
};
use crate::audio::AudioEncoding;
use crate::config::GoogleConfig;
use crate::error::{Error, Result};

const LINEAR16: &str = "LINEAR16";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSpeakerInput<'a> {
    multi_speaker_markup: MultiSpeakerMarkup<'a>,
}

#[derive(Debug, Serialize)]
struct MultiSpeakerMarkup<'a> {
    turns: &'a [Turn],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LongAudioRequest<'a> {
    input: MultiSpeakerInput<'a>,
    audio_config: AudioConfig<'a>,
    voice: VoiceSelection<'a>,
    output_gcs_uri: &'a str,
}

/// `google.longrunning.Operation`
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl Operation {
    fn status(&self) -> OperationStatus {
        match (&self.error, self.done) {
            (Some(error), _) => {
                OperationStatus::Failed(format!("{} (code {})", error.message, error.code))
            }
            (None, true) => OperationStatus::Succeeded,
            (None, false) => OperationStatus::Running,
        }
    }
}

/// Google Text-to-Speech client for single lines and long multi-speaker audio
#[derive(Debug, Clone)]
pub struct GoogleTtsProvider {
    client: Client,
    base_url: String,
    access_token: String,
    language_code: String,
    parent: Option<String>,
}

impl GoogleTtsProvider {
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        require_credential(&access_token, "Google access token")?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token,
            language_code: config.language_code.clone(),
            parent: config.parent.clone(),
        })
    }

    fn parent(&self) -> Result<&str> {
        self.parent
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                Error::ConfigError("google.parent is required for long audio synthesis".to_string())
            })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsProvider {
    fn name(&self) -> &str {
        "google-tts"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio> {
        let body = SynthesizeRequest {
            input: TextInput {
                text: &request.text,
            },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: &request.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: LINEAR16,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1beta1/text:synthesize", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(SpeechSynthesizer::name(self), response).await);
        }

        let synthesized: SynthesizeResponse = response.json().await?;
        let data = decode_base64(&synthesized.audio_content)?;
        debug!("Google synthesize returned {} bytes", data.len());

        // LINEAR16 responses carry a WAV header
        Ok(SynthesizedAudio {
            data,
            encoding: AudioEncoding::Wav,
        })
    }
}

#[async_trait]
impl LongAudioSynthesizer for GoogleTtsProvider {
    fn name(&self) -> &str {
        "google-long-audio"
    }

    async fn start(&self, request: &MultiSpeakerRequest) -> Result<OperationHandle> {
        let parent = self.parent()?;
        let body = LongAudioRequest {
            input: MultiSpeakerInput {
                multi_speaker_markup: MultiSpeakerMarkup {
                    turns: &request.turns,
                },
            },
            audio_config: AudioConfig {
                audio_encoding: LINEAR16,
            },
            voice: VoiceSelection {
                language_code: &request.language_code,
                name: &request.voice_name,
            },
            output_gcs_uri: &request.output_uri,
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta1/{}:synthesizeLongAudio",
                self.base_url, parent
            ))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(LongAudioSynthesizer::name(self), response).await);
        }

        let operation: Operation = response.json().await?;
        debug!("Started long audio operation {}", operation.name);
        Ok(OperationHandle {
            name: operation.name,
        })
    }

    async fn poll(&self, operation: &OperationHandle) -> Result<OperationStatus> {
        let response = self
            .client
            .get(format!("{}/v1beta1/{}", self.base_url, operation.name))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(LongAudioSynthesizer::name(self), response).await);
        }

        let current: Operation = response.json().await?;
        Ok(current.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{decode, AudioEncoder};
    use base64::Engine;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PARENT: &str = "projects/demo/locations/global";

    fn test_config(base_url: &str) -> GoogleConfig {
        GoogleConfig {
            base_url: base_url.to_string(),
            parent: Some(PARENT.to_string()),
            ..GoogleConfig::default()
        }
    }

    fn long_request() -> MultiSpeakerRequest {
        MultiSpeakerRequest {
            turns: vec![
                Turn {
                    text: "Hei, takk for sist".to_string(),
                    speaker: "R".to_string(),
                },
                Turn {
                    text: "Takk for sist, ja.".to_string(),
                    speaker: "S".to_string(),
                },
            ],
            voice_name: "en-US-Studio-MultiSpeaker".to_string(),
            language_code: "en-US".to_string(),
            output_uri: "gs://bucket/dialog.wav".to_string(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_decodes_linear16_wav() {
        let wav = AudioEncoder::new(24000, 1)
            .encode_wav(&vec![0.0; 2400])
            .unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&wav);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta1/text:synthesize"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(json!({
                "input": {"text": "Så, hvordan går det?"},
                "voice": {"languageCode": "en-US", "name": "en-US-Studio-O"},
                "audioConfig": {"audioEncoding": "LINEAR16"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audioContent": encoded
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let audio = provider
            .synthesize(&SynthesisRequest::new("Så, hvordan går det?", "en-US-Studio-O"))
            .await
            .unwrap();

        assert_eq!(audio.encoding, AudioEncoding::Wav);
        let segment = decode(&audio.data, audio.encoding).unwrap();
        assert_eq!(segment.frames(), 2400);
    }

    #[tokio::test]
    async fn test_start_long_audio_sends_turns_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta1/{}:synthesizeLongAudio", PARENT)))
            .and(body_json(json!({
                "input": {"multiSpeakerMarkup": {"turns": [
                    {"text": "Hei, takk for sist", "speaker": "R"},
                    {"text": "Takk for sist, ja.", "speaker": "S"}
                ]}},
                "audioConfig": {"audioEncoding": "LINEAR16"},
                "voice": {"languageCode": "en-US", "name": "en-US-Studio-MultiSpeaker"},
                "outputGcsUri": "gs://bucket/dialog.wav"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/locations/global/operations/42",
                "done": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let handle = provider.start(&long_request()).await.unwrap();
        assert_eq!(handle.name, "projects/demo/locations/global/operations/42");
    }

    #[tokio::test]
    async fn test_poll_maps_operation_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta1/operations/running"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "operations/running", "metadata": {}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta1/operations/done"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/done", "done": true, "response": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta1/operations/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/broken",
                "done": true,
                "error": {"code": 3, "message": "Invalid speaker"}
            })))
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let poll = |name: &str| OperationHandle {
            name: name.to_string(),
        };

        assert_eq!(
            provider.poll(&poll("operations/running")).await.unwrap(),
            OperationStatus::Running
        );
        assert_eq!(
            provider.poll(&poll("operations/done")).await.unwrap(),
            OperationStatus::Succeeded
        );
        match provider.poll(&poll("operations/broken")).await.unwrap() {
            OperationStatus::Failed(message) => assert!(message.contains("Invalid speaker")),
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_synthesize_rejects_invalid_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta1/text:synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audioContent": "%%% not base64 %%%"
            })))
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let err = provider
            .synthesize(&SynthesisRequest::new("Jo.", "en-US-Standard-A"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    fn google_error(code: u16, message: &str, status: &str) -> ResponseTemplate {
        ResponseTemplate::new(code).set_body_json(json!({
            "error": {"code": code, "message": message, "status": status}
        }))
    }

    fn assert_provider_error(err: Error, expected: &str) {
        match err {
            Error::ProviderError(message) => {
                assert!(message.contains(expected), "message was {:?}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_synthesize_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta1/text:synthesize"))
            .respond_with(google_error(
                403,
                "Caller does not have permission",
                "PERMISSION_DENIED",
            ))
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let err = provider
            .synthesize(&SynthesisRequest::new("Jo.", "en-US-Standard-A"))
            .await
            .unwrap_err();
        assert_provider_error(err, "Caller does not have permission");
    }

    #[tokio::test]
    async fn test_start_long_audio_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta1/{}:synthesizeLongAudio", PARENT)))
            .respond_with(google_error(503, "The service is currently unavailable", "UNAVAILABLE"))
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let err = provider.start(&long_request()).await.unwrap_err();
        assert_provider_error(err, "The service is currently unavailable");
    }

    #[tokio::test]
    async fn test_poll_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta1/operations/missing"))
            .respond_with(google_error(404, "Operation not found", "NOT_FOUND"))
            .mount(&server)
            .await;

        let provider = GoogleTtsProvider::new(&test_config(&server.uri()), "token").unwrap();
        let handle = OperationHandle {
            name: "operations/missing".to_string(),
        };
        let err = provider.poll(&handle).await.unwrap_err();
        assert_provider_error(err, "Operation not found");
    }

    #[tokio::test]
    async fn test_start_requires_parent() {
        let config = GoogleConfig {
            parent: None,
            ..GoogleConfig::default()
        };
        let provider = GoogleTtsProvider::new(&config, "token").unwrap();
        let err = provider.start(&long_request()).await.unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
