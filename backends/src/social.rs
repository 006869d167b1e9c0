//! Graph-style social platform client.
//!
//! Covers the four platform surfaces the engine needs: the two-step media
//! publish flow (container upload, publish, status polling), comments,
//! business discovery for resolving usernames to account ids, and recent
//! media listing for engagement targeting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

const GRAPH_API_VERSION: &str = "v19.0";

/// Maximum polling attempts while a media container processes.
const STATUS_POLL_ATTEMPTS: u32 = 15;

/// Errors from the social client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Graph API credentials not configured")]
    NoCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Media not found: {0}")]
    MediaMissing(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Kind of media being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Infer the media type from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mp4") | Some("mov") => MediaType::Video,
            _ => MediaType::Image,
        }
    }
}

/// Final state of a publish attempt.
///
/// `Pending` means the platform accepted the media but has not confirmed
/// processing. It is a retry candidate, distinct from `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Success,
    Pending,
    Error,
}

/// Result of a publish attempt.
#[derive(Debug, Clone)]
pub struct PublishResponse {
    pub status: PublishStatus,
    pub detail: String,
    pub creation_id: Option<String>,
}

/// A recent post fetched from another account.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: String,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
}

/// An account surfaced by keyword search.
#[derive(Debug, Clone)]
pub struct DiscoveredAccount {
    pub account_id: Option<String>,
    pub username: Option<String>,
}

/// Graph API client bound to one publishing account.
#[derive(Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    access_token: String,
    account_id: String,
    base_url: String,
}

impl GraphClient {
    /// Create a new client with an access token and the owning account id.
    pub fn new(access_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            access_token: access_token.into(),
            account_id: account_id.into(),
            base_url: format!("https://graph.facebook.com/{GRAPH_API_VERSION}"),
        }
    }

    /// Create a client from `INSTAGRAM_ACCESS_TOKEN` and
    /// `INSTAGRAM_BUSINESS_ACCOUNT_ID` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let token = std::env::var("INSTAGRAM_ACCESS_TOKEN").map_err(|_| Error::NoCredentials)?;
        let account = std::env::var("INSTAGRAM_BUSINESS_ACCOUNT_ID")
            .map_err(|_| Error::NoCredentials)?;
        Ok(Self::new(token, account))
    }

    /// Publish media to the feed: upload a container, trigger publish, and
    /// poll until the platform confirms processing or we give up.
    pub async fn publish_media(
        &self,
        media_path: &Path,
        caption: &str,
        media_type: MediaType,
    ) -> Result<PublishResponse, Error> {
        if !media_path.exists() {
            return Err(Error::MediaMissing(media_path.display().to_string()));
        }

        let creation_id = self
            .create_media_container(media_path, caption, media_type)
            .await?;
        self.trigger_publish(&creation_id).await?;
        let status = self.poll_container_status(&creation_id).await?;

        let detail = match status {
            PublishStatus::Success => "Posted to feed successfully.".to_string(),
            PublishStatus::Pending => "Publish pending confirmation.".to_string(),
            PublishStatus::Error => "Media container failed to process.".to_string(),
        };

        Ok(PublishResponse {
            status,
            detail,
            creation_id: Some(creation_id),
        })
    }

    /// Post a comment on a media object, returning the new comment id.
    pub async fn comment(&self, media_id: &str, text: &str) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/{}/comments", self.base_url, media_id))
            .form(&[("message", text), ("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        value
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Parse("comment response missing id".to_string()))
    }

    /// Resolve a username to a platform account id via business discovery.
    ///
    /// Returns `None` when the account is not discoverable.
    pub async fn resolve_account_id(&self, username: &str) -> Result<Option<String>, Error> {
        let fields = format!(
            "business_discovery.username({username}){{id,username,followers_count,media_count}}"
        );
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, self.account_id))
            .query(&[
                ("fields", fields.as_str()),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        Ok(value
            .pointer("/business_discovery/id")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    /// Search pages by keyword, returning candidate accounts.
    pub async fn search_accounts(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<DiscoveredAccount>, Error> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("type", "page"),
                ("q", keyword),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        let items = value
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .map(|item| DiscoveredAccount {
                account_id: item.get("id").and_then(|v| v.as_str()).map(str::to_string),
                username: item
                    .get("username")
                    .or_else(|| item.get("name"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
            .collect())
    }

    /// Fetch the most recent posts for an account.
    pub async fn recent_media(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<Vec<MediaItem>, Error> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/{}/media", self.base_url, account_id))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "id,caption,timestamp,media_type,permalink"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        let items = value
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();

        let mut posts = Vec::new();
        for item in &items {
            let Some(id) = item.get("id").and_then(|v| v.as_str()) else {
                continue;
            };
            let Some(ts) = item
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(parse_timestamp)
            else {
                continue;
            };
            posts.push(MediaItem {
                id: id.to_string(),
                caption: item
                    .get("caption")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                timestamp: ts,
            });
        }
        Ok(posts)
    }

    async fn create_media_container(
        &self,
        media_path: &Path,
        caption: &str,
        media_type: MediaType,
    ) -> Result<String, Error> {
        let bytes = tokio::fs::read(media_path)
            .await
            .map_err(|e| Error::MediaMissing(format!("{}: {e}", media_path.display())))?;

        let field = match media_type {
            MediaType::Image => "image_file",
            MediaType::Video => "video_file",
        };
        let file_name = media_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "media".to_string());

        let form = reqwest::multipart::Form::new()
            .text("caption", caption.to_string())
            .text("access_token", self.access_token.clone())
            .part(
                field,
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .client
            .post(format!("{}/{}/media", self.base_url, self.account_id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        value
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Parse("container response missing id".to_string()))
    }

    async fn trigger_publish(&self, creation_id: &str) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/{}/media_publish", self.base_url, self.account_id))
            .form(&[
                ("creation_id", creation_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let value = self.check(response).await?;
        value
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Parse("publish response missing id".to_string()))
    }

    async fn poll_container_status(&self, creation_id: &str) -> Result<PublishStatus, Error> {
        for attempt in 0..STATUS_POLL_ATTEMPTS {
            let response = self
                .client
                .get(format!("{}/{}", self.base_url, creation_id))
                .query(&[
                    ("fields", "status_code,status"),
                    ("access_token", self.access_token.as_str()),
                ])
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            let value = self.check(response).await?;
            let status = value
                .get("status_code")
                .or_else(|| value.get("status"))
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            match status {
                "FINISHED" | "FINISHED_SUCCESS" => return Ok(PublishStatus::Success),
                "ERROR" | "ERROR_UNKNOWN" | "FAILED" => return Ok(PublishStatus::Error),
                _ => {}
            }

            let backoff = std::time::Duration::from_millis(2000 + u64::from(attempt) * 500);
            tokio::time::sleep(backoff).await;
        }

        Ok(PublishStatus::Pending)
    }

    /// Map non-2xx responses and `error` payloads to `Error::Api`.
    async fn check(&self, response: reqwest::Response) -> Result<Value, Error> {
        let status = response.status().as_u16();
        let value: Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        if status >= 400 || value.get("error").is_some() {
            let message = value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown Graph API error")
                .to_string();
            return Err(Error::Api { status, message });
        }
        Ok(value)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw.replace('Z', "+00:00"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_type_from_path() {
        assert_eq!(
            MediaType::from_path(&PathBuf::from("clip.mp4")),
            MediaType::Video
        );
        assert_eq!(
            MediaType::from_path(&PathBuf::from("clip.mov")),
            MediaType::Video
        );
        assert_eq!(
            MediaType::from_path(&PathBuf::from("shot.png")),
            MediaType::Image
        );
        assert_eq!(
            MediaType::from_path(&PathBuf::from("no_extension")),
            MediaType::Image
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2026-07-30T08:15:00+00:00").is_some());
        assert!(parse_timestamp("2026-07-30T08:15:00Z").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
