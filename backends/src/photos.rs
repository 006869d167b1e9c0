//! Stock-photo search client for background reference imagery.
//!
//! An empty result set is a normal outcome here, not an error; the engine
//! treats missing references as lowered background confidence.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const API_BASE: &str = "https://api.pexels.com/v1";

/// Errors from the photo-search client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Photo-search API client.
#[derive(Clone)]
pub struct PhotoClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<PhotoItem>,
}

#[derive(Deserialize)]
struct PhotoItem {
    src: PhotoSrc,
}

#[derive(Deserialize)]
struct PhotoSrc {
    large2x: String,
}

impl PhotoClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
        }
    }

    /// Create a client from the `PEXELS_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("PEXELS_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Search for photos and return their download URLs.
    pub async fn search(&self, query: &str, per_page: usize) -> Result<Vec<String>, Error> {
        let per_page = per_page.to_string();
        let response = self
            .client
            .get(format!("{API_BASE}/search"))
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parsed.photos.into_iter().map(|p| p.src.large2x).collect())
    }

    /// Search for up to `max_images` photos and download them into `out_dir`.
    ///
    /// Individual download failures are skipped; the result holds whatever
    /// made it to disk.
    pub async fn fetch_references(
        &self,
        query: &str,
        max_images: usize,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, Error> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|source| Error::Io {
                path: out_dir.display().to_string(),
                source,
            })?;

        let urls = self.search(query, max_images).await?;
        let safe: String = query
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();

        let mut paths = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            let dest = out_dir.join(format!("ref_{safe}_{i}.jpg"));
            match self.download(url, &dest).await {
                Ok(()) => paths.push(dest),
                Err(_) => continue,
            }
        }
        Ok(paths)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(Error::Api {
                status,
                message: "download failed".to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| Error::Io {
                path: dest.display().to_string(),
                source,
            })
    }
}
