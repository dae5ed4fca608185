//! Actor to voice and actor to speaker-tag mappings

use std::collections::BTreeMap;

use crate::dialog::Dialog;
use crate::error::{Error, Result};

/// Static mapping from actor identifier to a provider token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorMap {
    entries: BTreeMap<u32, String>,
}

/// Actor to provider voice name (per-line synthesis)
pub type VoiceMap = ActorMap;

/// Actor to single-letter speaker tag (multi-speaker batch)
pub type SpeakerTagMap = ActorMap;

impl ActorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, actor: u32, value: impl Into<String>) -> Self {
        self.insert(actor, value);
        self
    }

    pub fn insert(&mut self, actor: u32, value: impl Into<String>) {
        self.entries.insert(actor, value.into());
    }

    /// Parse a mapping whose keys are actor numbers written as strings,
    /// as they appear in TOML tables and environment variables.
    pub fn from_string_keys(raw: &BTreeMap<String, String>) -> Result<Self> {
        let mut map = Self::new();
        for (key, value) in raw {
            let actor = key.trim().parse::<u32>().map_err(|_| {
                Error::ConfigError(format!("actor key '{}' is not a number", key))
            })?;
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "actor {} is mapped to an empty value",
                    actor
                )));
            }
            map.insert(actor, value.clone());
        }
        Ok(map)
    }

    /// Inverse of [`ActorMap::from_string_keys`], for config tables
    pub fn to_string_keys(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(actor, value)| (actor.to_string(), value.clone()))
            .collect()
    }

    /// OpenAI voices for actors 0 to 5
    pub fn default_voices() -> Self {
        Self::indexed(&["alloy", "echo", "fable", "onyx", "nova", "shimmer"])
    }

    /// Google en-US voices for actors 0 to 5
    pub fn default_google_voices() -> Self {
        Self::indexed(&[
            "en-US-Standard-A",
            "en-US-Standard-B",
            "en-US-Standard-C",
            "en-US-Standard-D",
            "en-US-Standard-E",
            "en-US-Standard-F",
        ])
    }

    fn indexed(values: &[&str]) -> Self {
        values
            .iter()
            .enumerate()
            .fold(Self::new(), |map, (actor, value)| map.with(actor as u32, *value))
    }

    /// Speaker tags used by the original multi-speaker script
    pub fn default_speaker_tags() -> Self {
        Self::new()
            .with(2, "U")
            .with(3, "T")
            .with(4, "R")
            .with(5, "S")
    }

    pub fn resolve(&self, actor: u32) -> Result<&str> {
        self.entries
            .get(&actor)
            .map(String::as_str)
            .ok_or(Error::UnknownActor { actor })
    }

    /// Check that every actor of `dialog` is mapped, failing on the first
    /// unmapped actor in speaking order.
    pub fn validate(&self, dialog: &Dialog) -> Result<()> {
        for actor in dialog.actors() {
            self.resolve(actor)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
