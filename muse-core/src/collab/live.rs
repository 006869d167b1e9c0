//! Live adapters binding the collaborator traits to the `backends` clients.
//!
//! Error mapping is where the transient/fatal split is decided: network
//! and 5xx/429 failures are worth retrying, missing keys and auth
//! rejections are not.

use super::{
    CommentBackend, DiscoveredAccount, ImageGenerator, MediaPost, MediaType, PhotoSearch,
    PublishBackend, PublishReceipt, SocialDiscovery, TextGenerator,
};
use crate::error::{CollabError, CollabResult};
use async_trait::async_trait;
use backends::{imagen, llm, photos, social};
use std::path::{Path, PathBuf};

fn retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Chat-completion backed text generator.
pub struct LiveTextGenerator {
    client: llm::ChatClient,
}

impl LiveTextGenerator {
    pub fn new(client: llm::ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for LiveTextGenerator {
    async fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> CollabResult<String> {
        let mut request = llm::ChatRequest::new(prompt)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        self.client.complete(&request).await.map_err(|err| match err {
            llm::Error::NoApiKey => CollabError::fatal(err.to_string()),
            llm::Error::Api { status, .. } if !retryable_status(status) => {
                CollabError::fatal(err.to_string())
            }
            other => CollabError::transient(other.to_string()),
        })
    }
}

/// Image-generation backed image generator.
pub struct LiveImageGenerator {
    client: imagen::ImageClient,
}

impl LiveImageGenerator {
    pub fn new(client: imagen::ImageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageGenerator for LiveImageGenerator {
    async fn generate(
        &self,
        persona_refs: &[PathBuf],
        background_refs: &[PathBuf],
        instructions: &str,
    ) -> CollabResult<Vec<u8>> {
        self.client
            .generate(instructions, persona_refs, background_refs)
            .await
            .map_err(|err| match err {
                imagen::Error::NoApiKey => CollabError::fatal(err.to_string()),
                imagen::Error::Api { status, .. } if !retryable_status(status) => {
                    CollabError::fatal(err.to_string())
                }
                other => CollabError::transient(other.to_string()),
            })
    }
}

/// Photo-search backed reference fetcher, downloading into a fixed
/// references directory.
pub struct LivePhotoSearch {
    client: photos::PhotoClient,
    out_dir: PathBuf,
}

impl LivePhotoSearch {
    pub fn new(client: photos::PhotoClient, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl PhotoSearch for LivePhotoSearch {
    async fn search(&self, keywords: &[String], max_count: usize) -> CollabResult<Vec<PathBuf>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let query = keywords.join(" ").to_lowercase();
        self.client
            .fetch_references(&query, max_count, &self.out_dir)
            .await
            .map_err(|err| CollabError::transient(err.to_string()))
    }
}

/// Graph-API backed publisher.
pub struct LivePublisher {
    client: social::GraphClient,
}

impl LivePublisher {
    pub fn new(client: social::GraphClient) -> Self {
        Self { client }
    }
}

fn map_social_err(err: social::Error) -> CollabError {
    match err {
        social::Error::NoCredentials => CollabError::fatal(err.to_string()),
        social::Error::Api { status, .. } if !retryable_status(status) => {
            CollabError::fatal(err.to_string())
        }
        other => CollabError::transient(other.to_string()),
    }
}

#[async_trait]
impl PublishBackend for LivePublisher {
    async fn publish(
        &self,
        media_path: &Path,
        caption: &str,
        media_type: MediaType,
    ) -> CollabResult<PublishReceipt> {
        let response = self
            .client
            .publish_media(media_path, caption, media_type)
            .await
            .map_err(map_social_err)?;

        Ok(PublishReceipt {
            status: response.status,
            detail: response.detail,
        })
    }
}

#[async_trait]
impl CommentBackend for LivePublisher {
    async fn comment(&self, media_id: &str, text: &str) -> CollabResult<String> {
        self.client
            .comment(media_id, text)
            .await
            .map_err(map_social_err)
    }
}

#[async_trait]
impl SocialDiscovery for LivePublisher {
    async fn resolve_account(&self, username: &str) -> CollabResult<Option<String>> {
        self.client
            .resolve_account_id(username)
            .await
            .map_err(map_social_err)
    }

    async fn search_accounts(
        &self,
        keyword: &str,
        limit: usize,
    ) -> CollabResult<Vec<DiscoveredAccount>> {
        let accounts = self
            .client
            .search_accounts(keyword, limit)
            .await
            .map_err(map_social_err)?;
        Ok(accounts
            .into_iter()
            .map(|a| DiscoveredAccount {
                username: a.username,
                account_id: a.account_id,
            })
            .collect())
    }

    async fn recent_media(&self, account_id: &str, limit: usize) -> CollabResult<Vec<MediaPost>> {
        let items = self
            .client
            .recent_media(account_id, limit)
            .await
            .map_err(map_social_err)?;
        Ok(items
            .into_iter()
            .map(|m| MediaPost {
                id: m.id,
                caption: m.caption,
                timestamp: m.timestamp,
            })
            .collect())
    }
}
