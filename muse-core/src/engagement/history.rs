//! Append-only engagement history.
//!
//! Every comment attempt, success or failure, is appended and persisted
//! immediately, so a crash mid-cycle loses at most the in-flight action.
//! The file is trimmed to the newest entries on load.

use crate::error::StateError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Entries kept after the trim on load.
pub const HISTORY_CAP: usize = 400;

/// How far back comment-text uniqueness looks.
pub const UNIQUE_COMMENT_WINDOW: usize = 80;

/// Outcome of one comment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
}

/// One recorded comment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub account_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub media_id: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub beat: String,
    pub status: Outcome,
}

/// File-backed engagement history, oldest first.
#[derive(Debug)]
pub struct EngagementHistory {
    path: PathBuf,
    entries: Vec<EngagementRecord>,
}

impl EngagementHistory {
    /// Load history, trimming to the cap. Missing or corrupt files yield
    /// empty history.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut entries: Vec<EngagementRecord> = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), %err, "could not decode history, resetting");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        if entries.len() > HISTORY_CAP {
            entries.drain(..entries.len() - HISTORY_CAP);
        }

        Self { path, entries }
    }

    /// Empty in-memory history bound to a path.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[EngagementRecord] {
        &self.entries
    }

    /// Whether an account had a recorded attempt inside the cooldown
    /// window. Scans most-recent-first and stops at the first entry for
    /// that account, since only the latest contact matters.
    pub fn account_in_cooldown(
        &self,
        account_id: &str,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let cutoff = now - cooldown;
        for entry in self.entries.iter().rev() {
            if entry.account_id == account_id {
                return entry.timestamp > cutoff;
            }
        }
        false
    }

    /// Whether a specific post already has a recorded comment.
    pub fn has_commented(&self, media_id: &str) -> bool {
        self.entries.iter().any(|e| e.media_id == media_id)
    }

    /// Whether a candidate comment text is absent from the recent window.
    pub fn is_unique_comment(&self, candidate: &str) -> bool {
        let start = self.entries.len().saturating_sub(UNIQUE_COMMENT_WINDOW);
        !self.entries[start..].iter().any(|e| e.comment == candidate)
    }

    /// Append one attempt and persist the whole file.
    pub async fn append(&mut self, record: EngagementRecord) -> Result<(), StateError> {
        self.entries.push(record);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Path this history persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(account: &str, media: &str, comment: &str, hours_ago: i64) -> EngagementRecord {
        EngagementRecord {
            account_id: account.to_string(),
            username: None,
            media_id: media.to_string(),
            comment: comment.to_string(),
            timestamp: Utc::now() - Duration::hours(hours_ago),
            mood: "calm".to_string(),
            beat: String::new(),
            status: Outcome::Success,
        }
    }

    #[test]
    fn test_cooldown_recent_contact() {
        let mut history = EngagementHistory::empty("unused.json");
        history.entries.push(record("acct-x", "m1", "nice", 1));

        assert!(history.account_in_cooldown("acct-x", Duration::hours(4), Utc::now()));
        assert!(!history.account_in_cooldown("acct-y", Duration::hours(4), Utc::now()));
    }

    #[test]
    fn test_cooldown_expired_contact() {
        let mut history = EngagementHistory::empty("unused.json");
        history.entries.push(record("acct-x", "m1", "nice", 5));

        assert!(!history.account_in_cooldown("acct-x", Duration::hours(4), Utc::now()));
    }

    #[test]
    fn test_cooldown_uses_latest_entry_only() {
        let mut history = EngagementHistory::empty("unused.json");
        history.entries.push(record("acct-x", "m1", "nice", 1));
        history.entries.push(record("acct-x", "m2", "lovely", 50));

        // Newest entry for the account is 50h old, so the 1h-old one
        // earlier in the file is never reached.
        assert!(!history.account_in_cooldown("acct-x", Duration::hours(4), Utc::now()));
    }

    #[test]
    fn test_media_dedup() {
        let mut history = EngagementHistory::empty("unused.json");
        history.entries.push(record("acct-x", "m1", "nice", 1));
        assert!(history.has_commented("m1"));
        assert!(!history.has_commented("m2"));
    }

    #[test]
    fn test_comment_uniqueness_window() {
        let mut history = EngagementHistory::empty("unused.json");
        for i in 0..3 {
            history
                .entries
                .push(record("a", &format!("m{i}"), "Love the colors here…", 2));
        }
        assert!(!history.is_unique_comment("Love the colors here…"));
        assert!(history.is_unique_comment("Completely different words"));

        // Push the repeated text out of the 80-entry window.
        for i in 0..UNIQUE_COMMENT_WINDOW {
            history
                .entries
                .push(record("a", &format!("x{i}"), format!("filler {i}").as_str(), 1));
        }
        assert!(history.is_unique_comment("Love the colors here…"));
    }

    #[tokio::test]
    async fn test_append_persists_each_attempt() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut history = EngagementHistory::load(&path).await;
        history.append(record("acct-x", "m1", "nice", 0)).await.unwrap();
        history.append(record("acct-y", "m2", "warm", 0)).await.unwrap();

        let reloaded = EngagementHistory::load(&path).await;
        assert_eq!(reloaded.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_load_trims_to_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let entries: Vec<EngagementRecord> = (0..HISTORY_CAP + 25)
            .map(|i| record("a", &format!("m{i}"), "hello", 1))
            .collect();
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let history = EngagementHistory::load(&path).await;
        assert_eq!(history.entries().len(), HISTORY_CAP);
        // Oldest entries were dropped, newest kept.
        assert_eq!(history.entries()[0].media_id, "m25");
    }

    #[tokio::test]
    async fn test_corrupt_history_fails_open() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "][").unwrap();

        let history = EngagementHistory::load(&path).await;
        assert!(history.entries().is_empty());
    }
}
