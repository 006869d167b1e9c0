//! Post draft records and the file-backed draft store.
//!
//! Drafts are created by the orchestrator, have their `published` flag
//! flipped by the publish step, and are never deleted by the engine. The
//! whole record set is read-modify-written under one process-wide lock:
//! a single-writer design by construction.

use crate::error::DraftError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// A stored content draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub id: Uuid,
    pub idea: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub published: bool,
}

impl PostDraft {
    /// Create a new unpublished draft.
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            idea: idea.into(),
            caption: None,
            media_path: None,
            created_at: Utc::now(),
            published: false,
        }
    }

    /// Attach a caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Attach generated media.
    pub fn with_media(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_path = Some(path.into());
        self
    }
}

/// Persistent draft storage.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn create(&self, draft: PostDraft) -> Result<(), DraftError>;

    async fn get(&self, id: Uuid) -> Result<PostDraft, DraftError>;

    /// The newest draft that has not been published.
    async fn latest_unpublished(&self) -> Result<PostDraft, DraftError>;

    /// The newest `limit` drafts, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<PostDraft>, DraftError>;

    async fn mark_published(&self, id: Uuid) -> Result<(), DraftError>;
}

/// JSON-file draft store.
pub struct JsonDraftStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonDraftStore {
    /// Create a store bound to a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Vec<PostDraft> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(drafts) => drafts,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "corrupt draft file, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    async fn write_all(&self, drafts: &[PostDraft]) -> Result<(), DraftError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(drafts)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DraftStore for JsonDraftStore {
    async fn create(&self, draft: PostDraft) -> Result<(), DraftError> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await;
        drafts.push(draft);
        self.write_all(&drafts).await
    }

    async fn get(&self, id: Uuid) -> Result<PostDraft, DraftError> {
        let _guard = self.lock.lock().await;
        self.read_all()
            .await
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(DraftError::NotFound(id))
    }

    async fn latest_unpublished(&self) -> Result<PostDraft, DraftError> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await;
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts
            .into_iter()
            .find(|d| !d.published)
            .ok_or(DraftError::NoUnpublished)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PostDraft>, DraftError> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await;
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts.truncate(limit);
        Ok(drafts)
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), DraftError> {
        let _guard = self.lock.lock().await;
        let mut drafts = self.read_all().await;
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DraftError::NotFound(id))?;
        draft.published = true;
        self.write_all(&drafts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> (tempfile::TempDir, JsonDraftStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonDraftStore::new(dir.path().join("drafts.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = store();
        let draft = PostDraft::new("morning coffee run").with_caption("first coffee then life");
        let id = draft.id;
        store.create(draft).await.unwrap();

        let loaded = store.get(id).await.unwrap();
        assert_eq!(loaded.idea, "morning coffee run");
        assert!(!loaded.published);
    }

    #[tokio::test]
    async fn test_latest_unpublished_ordering() {
        let (_dir, store) = store();

        let mut old = PostDraft::new("old idea");
        old.created_at = Utc::now() - Duration::hours(5);
        let mut newer = PostDraft::new("newer idea");
        newer.created_at = Utc::now() - Duration::hours(1);
        let newer_id = newer.id;

        store.create(old).await.unwrap();
        store.create(newer).await.unwrap();

        let latest = store.latest_unpublished().await.unwrap();
        assert_eq!(latest.id, newer_id);

        store.mark_published(newer_id).await.unwrap();
        let latest = store.latest_unpublished().await.unwrap();
        assert_eq!(latest.idea, "old idea");
    }

    #[tokio::test]
    async fn test_no_unpublished() {
        let (_dir, store) = store();
        let draft = PostDraft::new("only one");
        let id = draft.id;
        store.create(draft).await.unwrap();
        store.mark_published(id).await.unwrap();

        assert!(matches!(
            store.latest_unpublished().await,
            Err(DraftError::NoUnpublished)
        ));
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let (_dir, store) = store();
        for i in 0..5 {
            let mut draft = PostDraft::new(format!("idea-{i}"));
            draft.created_at = Utc::now() - Duration::hours(10 - i);
            store.create(draft).await.unwrap();
        }

        let recent = store.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].idea, "idea-4");
        assert_eq!(recent[2].idea, "idea-2");
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_open() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "not json").unwrap();
        let recent = store.recent(10).await.unwrap();
        assert!(recent.is_empty());
    }
}
