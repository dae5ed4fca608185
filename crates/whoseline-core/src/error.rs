//! Error types for the Whoseline synthesis pipeline

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No voice or speaker mapped for actor {actor}")]
    UnknownActor { actor: u32 },

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("Audio error: {0}")]
    AudioError(String),

    #[error("Long-running operation failed: {0}")]
    OperationFailed(String),

    #[error("Long-running operation did not finish within {0:?}")]
    OperationTimeout(Duration),

    #[error("Synthesis aborted at line {line} after {completed} completed segment(s): {source}")]
    Aborted {
        line: usize,
        completed: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::AudioError(e.to_string())
    }
}
