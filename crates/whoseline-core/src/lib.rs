//! Whoseline Core - scripted dialog to synthesized audio
//!
//! Turns a sequence of `{actor, line}` records into one audio track by calling
//! a cloud speech provider once per line, or submits the whole dialog as one
//! multi-speaker long-running job.
//!
//! # Pipeline
//!
//! - Consecutive lines by the same actor are merged into one utterance
//! - Every actor is checked against the voice mapping before any request
//! - Lines are synthesized one at a time, decoded and appended in order
//! - The combined track is exported once, only if every line succeeded
//!
//! # Example
//!
//! ```ignore
//! use whoseline_core::{create_conversation, AppConfig, Dialog, NoProgress, OpenAiSpeechProvider};
//!
//! let config = AppConfig::load(None)?;
//! let provider = OpenAiSpeechProvider::new(&config.openai, config.openai_api_key()?)?;
//! let dialog = Dialog::load("script.json".as_ref())?;
//! let report = create_conversation(
//!     &provider,
//!     &config.voice_map()?,
//!     &dialog,
//!     (&config.pipeline).into(),
//!     &NoProgress,
//! )
//! .await?;
//! ```

pub mod audio;
pub mod batch;
pub mod config;
pub mod dialog;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod provider;

pub use audio::{AudioEncoder, AudioEncoding, AudioSegment, CombinedTrack};
pub use batch::{synthesize_multispeaker, BatchOptions, BatchReport};
pub use crate::config::AppConfig;
pub use dialog::{merge_consecutive, Dialog, DialogEntry};
pub use error::{Error, Result};
pub use mapping::{ActorMap, SpeakerTagMap, VoiceMap};
pub use pipeline::{
    create_conversation, NoProgress, Pipeline, PipelineOptions, PipelineReport, ProgressObserver,
};
pub use provider::{
    GoogleTtsProvider, LongAudioSynthesizer, OpenAiChatAudioProvider, OpenAiSpeechProvider,
    SpeechSynthesizer,
};
