//! Error types for the engine.
//!
//! The taxonomy follows how failures propagate: configuration errors are
//! fatal and cross the orchestrator boundary; collaborator errors are
//! absorbed at the call site (retried while transient, then degraded to a
//! fallback); corrupt persisted state is never fatal, stores fail open.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-class errors. The only kind the orchestrator raises.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingVar { name: &'static str },

    #[error("Persona '{slug}' not found at {path}")]
    PersonaNotFound { slug: String, path: PathBuf },

    #[error("Persona '{slug}' is missing required field: {field}")]
    PersonaField { slug: String, field: &'static str },

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from persisted-state writes.
///
/// Reads never produce these: corrupt or missing state files are replaced
/// with fresh state and a warning.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the draft store.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("No unpublished drafts available")]
    NoUnpublished,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A collaborator call failure, split by whether retrying can help.
#[derive(Debug, Clone, Error)]
pub enum CollabError {
    /// Network/API failure that may succeed on retry.
    #[error("Transient collaborator error: {reason}")]
    Transient { reason: String },

    /// The collaborator cannot work as configured; retrying is pointless.
    #[error("Fatal collaborator error: {reason}")]
    Fatal { reason: String },
}

impl CollabError {
    /// Build a transient error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Build a fatal error.
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Errors from a full content cycle. Only configuration problems escape;
/// everything else lands in the cycle's result record.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from publishing a stored draft.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Draft media is missing: {path}")]
    MissingMedia { path: PathBuf },

    #[error("Draft has no media to publish")]
    NoMedia,

    #[error("Publish backend error: {0}")]
    Backend(#[from] CollabError),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for collaborator operations.
pub type CollabResult<T> = std::result::Result<T, CollabError>;
