//! Generative image client.
//!
//! Wraps a `generateContent`-style endpoint that accepts a text prompt plus
//! inline reference images (persona identity shots first, then background
//! references) and returns the generated image bytes.

use base64::Engine as _;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Errors from the image-generation client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to read reference image {path}: {source}")]
    Reference {
        path: String,
        source: std::io::Error,
    },

    #[error("Response contained no image data")]
    NoImage,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Image-generation API client.
#[derive(Clone)]
pub struct ImageClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ImageClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(180))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Generate one image from a prompt and reference images.
    ///
    /// Persona references ground identity and are attached before background
    /// references, which ground the location.
    pub async fn generate(
        &self,
        prompt: &str,
        persona_refs: &[PathBuf],
        background_refs: &[PathBuf],
    ) -> Result<Vec<u8>, Error> {
        let mut parts = vec![json!({ "text": prompt })];
        for path in persona_refs.iter().chain(background_refs.iter()) {
            parts.push(inline_image_part(path).await?);
        }

        let body = json!({ "contents": [{ "parts": parts }] });
        let url = format!(
            "{API_BASE}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        extract_image_bytes(&parsed)
    }
}

/// Build an `inline_data` part from an image file on disk.
async fn inline_image_part(path: &Path) -> Result<Value, Error> {
    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Reference {
        path: path.display().to_string(),
        source,
    })?;

    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        _ => "image/jpeg",
    };

    Ok(json!({
        "inline_data": {
            "mime_type": mime,
            "data": base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }))
}

/// Pull the first inline image out of a generateContent response.
fn extract_image_bytes(response: &Value) -> Result<Vec<u8>, Error> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or(Error::NoImage)?;

    for part in parts {
        if let Some(data) = part.pointer("/inline_data/data").and_then(|d| d.as_str()) {
            return base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| Error::Parse(e.to_string()));
        }
    }

    Err(Error::NoImage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_image_bytes() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"fakepng");
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inline_data": { "mime_type": "image/png", "data": encoded } }
                    ]
                }
            }]
        });

        let bytes = extract_image_bytes(&response).unwrap();
        assert_eq!(bytes, b"fakepng");
    }

    #[test]
    fn test_extract_missing_image() {
        let response = json!({ "candidates": [{ "content": { "parts": [{ "text": "no image" }] } }] });
        assert!(matches!(extract_image_bytes(&response), Err(Error::NoImage)));
    }
}
