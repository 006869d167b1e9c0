//! Collaborator contracts for every external service the engine calls.
//!
//! The engine never talks HTTP directly: each unreliable external service
//! sits behind one of these traits, so cycles can distinguish "retry
//! later" from "configuration is broken" and tests can script every
//! failure mode.

use crate::error::{CollabError, CollabResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use backends::social::{MediaType, PublishStatus};

/// Result of a publish attempt, as the engine sees it.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub status: PublishStatus,
    pub detail: String,
}

/// A recent post on a targeted account.
#[derive(Debug, Clone)]
pub struct MediaPost {
    pub id: String,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
}

/// An account surfaced by keyword discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredAccount {
    pub username: Option<String>,
    pub account_id: Option<String>,
}

/// Idea/caption text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt. May fail or time out; callers fall back
    /// to deterministic text derived from the current arc and beat.
    async fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> CollabResult<String>;
}

/// Synthetic image generation grounded on reference images.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        persona_refs: &[PathBuf],
        background_refs: &[PathBuf],
        instructions: &str,
    ) -> CollabResult<Vec<u8>>;
}

/// Reference photo search. An empty result is a valid outcome (it lowers
/// background confidence), not an error.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn search(&self, keywords: &[String], max_count: usize) -> CollabResult<Vec<PathBuf>>;
}

/// Social platform publishing.
#[async_trait]
pub trait PublishBackend: Send + Sync {
    async fn publish(
        &self,
        media_path: &Path,
        caption: &str,
        media_type: MediaType,
    ) -> CollabResult<PublishReceipt>;
}

/// Social platform commenting.
#[async_trait]
pub trait CommentBackend: Send + Sync {
    /// Post a comment and return the platform comment id.
    async fn comment(&self, media_id: &str, text: &str) -> CollabResult<String>;
}

/// Account discovery and media listing for engagement targeting.
#[async_trait]
pub trait SocialDiscovery: Send + Sync {
    /// Resolve a username to a platform account id, if discoverable.
    async fn resolve_account(&self, username: &str) -> CollabResult<Option<String>>;

    /// Search accounts by keyword.
    async fn search_accounts(
        &self,
        keyword: &str,
        limit: usize,
    ) -> CollabResult<Vec<DiscoveredAccount>>;

    /// List an account's most recent posts.
    async fn recent_media(&self, account_id: &str, limit: usize) -> CollabResult<Vec<MediaPost>>;
}

/// Stand-in for any collaborator whose credentials are absent.
///
/// Calls degrade the way the engine expects: generators fail fatally (no
/// point retrying an unconfigured backend) while lookups return empty.
pub struct Disabled(pub &'static str);

impl Disabled {
    fn fatal<T>(&self) -> CollabResult<T> {
        Err(CollabError::fatal(format!("{} backend not configured", self.0)))
    }
}

#[async_trait]
impl TextGenerator for Disabled {
    async fn generate(
        &self,
        _system: Option<&str>,
        _prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> CollabResult<String> {
        self.fatal()
    }
}

#[async_trait]
impl ImageGenerator for Disabled {
    async fn generate(
        &self,
        _persona_refs: &[PathBuf],
        _background_refs: &[PathBuf],
        _instructions: &str,
    ) -> CollabResult<Vec<u8>> {
        self.fatal()
    }
}

#[async_trait]
impl PhotoSearch for Disabled {
    async fn search(&self, _keywords: &[String], _max_count: usize) -> CollabResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl PublishBackend for Disabled {
    async fn publish(
        &self,
        _media_path: &Path,
        _caption: &str,
        _media_type: MediaType,
    ) -> CollabResult<PublishReceipt> {
        self.fatal()
    }
}

#[async_trait]
impl CommentBackend for Disabled {
    async fn comment(&self, _media_id: &str, _text: &str) -> CollabResult<String> {
        self.fatal()
    }
}

#[async_trait]
impl SocialDiscovery for Disabled {
    async fn resolve_account(&self, _username: &str) -> CollabResult<Option<String>> {
        Ok(None)
    }

    async fn search_accounts(
        &self,
        _keyword: &str,
        _limit: usize,
    ) -> CollabResult<Vec<DiscoveredAccount>> {
        Ok(Vec::new())
    }

    async fn recent_media(&self, _account_id: &str, _limit: usize) -> CollabResult<Vec<MediaPost>> {
        Ok(Vec::new())
    }
}

pub mod live;
