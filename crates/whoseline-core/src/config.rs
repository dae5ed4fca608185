//! Configuration types and layered loading
//!
//! Sources are applied in order: built-in defaults, an optional TOML file, then
//! `WHOSELINE_*` environment variables. Nested keys use `__`, so
//! `WHOSELINE_OPENAI__BASE_URL` sets `openai.base_url` while
//! `WHOSELINE_OPENAI_API_KEY` sets the top-level `openai_api_key`.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::mapping::{ActorMap, SpeakerTagMap, VoiceMap};

const ENV_PREFIX: &str = "WHOSELINE";
const DEFAULT_CONFIG_FILE: &str = "whoseline";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the OpenAI providers
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OAuth access token for the Google Text-to-Speech API
    #[serde(default)]
    pub google_access_token: Option<String>,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    /// Actor number to OpenAI voice name, keys as strings
    #[serde(default = "default_voices")]
    pub voices: BTreeMap<String, String>,

    /// Actor number to multi-speaker tag, keys as strings
    #[serde(default = "default_speaker_tags")]
    pub speaker_tags: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_access_token: None,
            openai: OpenAiConfig::default(),
            google: GoogleConfig::default(),
            pipeline: PipelineConfig::default(),
            batch: BatchConfig::default(),
            voices: default_voices(),
            speaker_tags: default_speaker_tags(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or `whoseline.toml` in the working directory, if
    /// present) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], with an explicit environment map in place of
    /// the process environment when `env` is `Some`.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        non_empty(self.openai_api_key.as_deref()).ok_or_else(|| {
            Error::ConfigError(format!("{}_OPENAI_API_KEY is not set", ENV_PREFIX))
        })
    }

    pub fn google_access_token(&self) -> Result<&str> {
        non_empty(self.google_access_token.as_deref()).ok_or_else(|| {
            Error::ConfigError(format!("{}_GOOGLE_ACCESS_TOKEN is not set", ENV_PREFIX))
        })
    }

    /// Voices for the OpenAI providers
    pub fn voice_map(&self) -> Result<VoiceMap> {
        ActorMap::from_string_keys(&self.voices)
    }

    /// Voices for the Google per-line provider
    pub fn google_voice_map(&self) -> Result<VoiceMap> {
        ActorMap::from_string_keys(&self.google.voices)
    }

    pub fn speaker_tag_map(&self) -> Result<SpeakerTagMap> {
        ActorMap::from_string_keys(&self.speaker_tags)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// OpenAI endpoints and models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model for the `/audio/speech` endpoint
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// Audio-capable model for `/chat/completions`
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// System prompt asking the chat model to read lines verbatim
    #[serde(default = "default_chat_instructions")]
    pub chat_instructions: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            speech_model: default_speech_model(),
            chat_model: default_chat_model(),
            chat_instructions: default_chat_instructions(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Google Text-to-Speech settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// `projects/{project}/locations/{location}`, required for batch synthesis
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Actor number to Google voice name for per-line synthesis
    #[serde(default = "default_google_voices")]
    pub voices: BTreeMap<String, String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: default_google_base_url(),
            parent: None,
            language_code: default_language_code(),
            voices: default_google_voices(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GoogleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Per-line pipeline output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Directory for raw per-line payloads; nothing is written when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            scratch_dir: None,
        }
    }
}

/// Multi-speaker batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_voice")]
    pub voice_name: String,

    /// Destination object, e.g. `gs://bucket/dialog.wav`
    #[serde(default)]
    pub output_uri: Option<String>,

    /// Number of merged entries submitted
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    #[serde(default = "default_batch_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            voice_name: default_batch_voice(),
            output_uri: None,
            max_turns: default_max_turns(),
            timeout_secs: default_batch_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_voices() -> BTreeMap<String, String> {
    ActorMap::default_voices().to_string_keys()
}

fn default_google_voices() -> BTreeMap<String, String> {
    ActorMap::default_google_voices().to_string_keys()
}

fn default_speaker_tags() -> BTreeMap<String, String> {
    ActorMap::default_speaker_tags().to_string_keys()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_speech_model() -> String {
    "tts-1-hd".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-audio-preview".to_string()
}

fn default_chat_instructions() -> String {
    "Read the user's message aloud exactly as written. Do not add, omit or answer anything."
        .to_string()
}

fn default_google_base_url() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_output_path() -> PathBuf {
    PathBuf::from("conversation.wav")
}

fn default_batch_voice() -> String {
    "en-US-Studio-MultiSpeaker".to_string()
}

fn default_max_turns() -> usize {
    10
}

fn default_batch_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_match_original_scripts() {
        let config = AppConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config.openai.speech_model, "tts-1-hd");
        assert_eq!(config.batch.max_turns, 10);
        assert_eq!(config.batch.timeout_secs, 300);
        assert_eq!(config.pipeline.output_path, PathBuf::from("conversation.wav"));
        assert_eq!(config.voice_map().unwrap().resolve(3).unwrap(), "onyx");
        assert_eq!(config.speaker_tag_map().unwrap().resolve(4).unwrap(), "R");
        assert_eq!(
            config.google_voice_map().unwrap().resolve(3).unwrap(),
            "en-US-Standard-D"
        );
    }

    #[test]
    fn test_google_voices_are_separate_from_openai_voices() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[voices]
1 = "echo"

[google.voices]
1 = "nb-NO-Standard-A"
"#
        )
        .unwrap();

        let config = AppConfig::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.voice_map().unwrap().resolve(1).unwrap(), "echo");
        let google = config.google_voice_map().unwrap();
        assert_eq!(google.len(), 1);
        assert_eq!(google.resolve(1).unwrap(), "nb-NO-Standard-A");
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let config = AppConfig::load_with_env(None, env(&[])).unwrap();
        assert!(matches!(config.openai_api_key(), Err(Error::ConfigError(_))));
        assert!(matches!(
            config.google_access_token(),
            Err(Error::ConfigError(_))
        ));

        let blank = AppConfig {
            openai_api_key: Some("   ".to_string()),
            ..AppConfig::default()
        };
        assert!(blank.openai_api_key().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::load_with_env(
            None,
            env(&[
                ("WHOSELINE_OPENAI_API_KEY", "sk-test"),
                ("WHOSELINE_OPENAI__BASE_URL", "http://localhost:9999"),
                ("WHOSELINE_BATCH__MAX_TURNS", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.openai_api_key().unwrap(), "sk-test");
        assert_eq!(config.openai.base_url, "http://localhost:9999");
        assert_eq!(config.batch.max_turns, 4);
    }

    #[test]
    fn test_toml_file_replaces_mappings() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[pipeline]
output_path = "out/dialog.wav"
scratch_dir = "temp_audio"

[google]
parent = "projects/demo/locations/global"

[voices]
4 = "fable"
5 = "nova"
"#
        )
        .unwrap();

        let config = AppConfig::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.pipeline.output_path, PathBuf::from("out/dialog.wav"));
        assert_eq!(config.pipeline.scratch_dir, Some(PathBuf::from("temp_audio")));
        assert_eq!(
            config.google.parent.as_deref(),
            Some("projects/demo/locations/global")
        );

        let voices = config.voice_map().unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices.resolve(4).unwrap(), "fable");
        assert!(voices.resolve(0).is_err());
    }

    #[test]
    fn test_demo_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/whoseline.toml");
        let config = AppConfig::load_with_env(Some(path.as_path()), env(&[])).unwrap();
        assert_eq!(config.voice_map().unwrap().len(), 6);
        assert_eq!(config.google_voice_map().unwrap().len(), 6);
        assert_eq!(config.speaker_tag_map().unwrap().resolve(2).unwrap(), "U");
        assert_eq!(
            config.batch.output_uri.as_deref(),
            Some("gs://my-bucket/dialog_multispeaker.wav")
        );
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/whoseline.toml");
        let result = AppConfig::load_with_env(Some(missing), env(&[]));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
