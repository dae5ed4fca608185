//! Scripted dialog model, loading and same-actor merging

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// One scripted utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogEntry {
    /// Speaking participant
    pub actor: u32,
    /// Text to be spoken
    pub line: String,
}

impl DialogEntry {
    pub fn new(actor: u32, line: impl Into<String>) -> Self {
        Self {
            actor,
            line: line.into(),
        }
    }
}

/// Ordered sequence of entries in speaking order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dialog {
    entries: Vec<DialogEntry>,
}

impl Dialog {
    pub fn new(entries: Vec<DialogEntry>) -> Self {
        Self { entries }
    }

    /// Load a dialog from a JSON file of `{"actor": .., "line": ..}` records
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let dialog = Self::from_json(&raw)?;
        debug!("Loaded {} dialog entries from {:?}", dialog.len(), path);
        Ok(dialog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Collapse consecutive lines of the same actor into one entry
    pub fn merged(&self) -> Self {
        Self::new(merge_consecutive(&self.entries))
    }

    /// First `max` entries, keeping order
    pub fn truncated(&self, max: usize) -> Self {
        Self::new(self.entries.iter().take(max).cloned().collect())
    }

    /// Distinct actors in order of first appearance
    pub fn actors(&self) -> Vec<u32> {
        let mut actors = Vec::new();
        for entry in &self.entries {
            if !actors.contains(&entry.actor) {
                actors.push(entry.actor);
            }
        }
        actors
    }

    pub fn entries(&self) -> &[DialogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DialogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge consecutive entries spoken by the same actor.
///
/// Texts are joined with a single space and are not trimmed. The result never
/// has two neighbouring entries with the same actor.
pub fn merge_consecutive(entries: &[DialogEntry]) -> Vec<DialogEntry> {
    let mut merged: Vec<DialogEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match merged.last_mut() {
            Some(last) if last.actor == entry.actor => {
                last.line.push(' ');
                last.line.push_str(&entry.line);
            }
            _ => merged.push(entry.clone()),
        }
    }
    merged
}
