//! Persisted rotation indices for deterministic variation cycles.
//!
//! Every content-selection axis keys into this store so repeated cycles
//! walk through their option lists instead of re-rolling them. State is
//! loaded once per content pass, mutated in memory, and written back once
//! at the end, and only if something actually advanced.

use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct VariationFile {
    #[serde(default)]
    indexes: HashMap<String, u32>,
}

/// Persisted index tracker for deterministic prompt variation cycles.
#[derive(Debug)]
pub struct VariationState {
    path: PathBuf,
    indexes: HashMap<String, u32>,
    dirty: bool,
}

impl VariationState {
    /// Load state from disk. A missing or corrupt file yields empty state.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let indexes = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<VariationFile>(&content) {
                Ok(file) => file.indexes,
                Err(err) => {
                    warn!(path = %path.display(), %err, "corrupt variation state, starting over");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            indexes,
            dirty: false,
        }
    }

    /// Create empty in-memory state bound to a path (used by tests and
    /// fresh installs).
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            indexes: HashMap::new(),
            dirty: false,
        }
    }

    /// Current rotation index for `key` in `[0, length)`, without side
    /// effects. A non-positive length maps to index 0.
    pub fn get_index(&self, key: &str, length: usize) -> usize {
        if length == 0 {
            return 0;
        }
        self.indexes.get(key).copied().unwrap_or(0) as usize % length
    }

    /// Advance the stored index for `key` modulo `length`, marking state
    /// dirty. No-op when the cycle has no length.
    pub fn advance(&mut self, key: &str, length: usize) {
        if length == 0 {
            return;
        }
        let current = self.get_index(key, length);
        self.indexes
            .insert(key.to_string(), ((current + 1) % length) as u32);
        self.dirty = true;
    }

    /// Drop the stored index for `key`.
    pub fn reset(&mut self, key: &str) {
        if self.indexes.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Whether there are unsaved advances.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist to disk if dirty since the last save, then clear the flag.
    ///
    /// Skipping clean saves avoids needless writes when a selection pass
    /// makes no progress (for example when every option was gated out).
    pub async fn save(&mut self) -> Result<(), StateError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = VariationFile {
            indexes: self.indexes.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&self.path, content).await?;
        self.dirty = false;
        Ok(())
    }

    /// Path this state persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
