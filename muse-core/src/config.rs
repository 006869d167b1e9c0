//! Runtime configuration read once from the environment.
//!
//! Credentials are optional at load time; each is validated only when the
//! feature that needs it is exercised, so a preview-only run works with no
//! keys at all.

use crate::error::{ConfigError, ConfigResult};
use std::path::PathBuf;
use tracing::info;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat-completion API key (ideas, captions).
    pub text_api_key: Option<String>,
    /// Image-generation API key.
    pub image_api_key: Option<String>,
    /// Photo-search API key.
    pub photo_api_key: Option<String>,
    /// Social platform access token.
    pub social_access_token: Option<String>,
    /// Social platform business account id.
    pub social_account_id: Option<String>,

    /// Root for persisted engine state.
    pub data_dir: PathBuf,
    /// Root for generated and downloaded media.
    pub asset_dir: PathBuf,
    /// Root holding persona definitions.
    pub persona_dir: PathBuf,

    /// Hours before the same account may be commented on again.
    pub engagement_cooldown_hours: i64,
    /// Minimum pause after a successful comment, in seconds.
    pub engagement_min_delay_secs: u64,
    /// Maximum pause after a successful comment, in seconds.
    pub engagement_max_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_api_key: None,
            image_api_key: None,
            photo_api_key: None,
            social_access_token: None,
            social_account_id: None,
            data_dir: PathBuf::from("data"),
            asset_dir: PathBuf::from("assets"),
            persona_dir: PathBuf::from("personas"),
            engagement_cooldown_hours: 24,
            engagement_min_delay_secs: 60,
            engagement_max_delay_secs: 180,
        }
    }
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            text_api_key: env_opt("OPENAI_API_KEY"),
            image_api_key: env_opt("GEMINI_API_KEY"),
            photo_api_key: env_opt("PEXELS_API_KEY"),
            social_access_token: env_opt("INSTAGRAM_ACCESS_TOKEN"),
            social_account_id: env_opt("INSTAGRAM_BUSINESS_ACCOUNT_ID"),
            data_dir: env_opt("MUSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            asset_dir: env_opt("MUSE_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_dir),
            persona_dir: env_opt("MUSE_PERSONA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.persona_dir),
            engagement_cooldown_hours: env_parse(
                "ENGAGEMENT_ACCOUNT_COOLDOWN_HOURS",
                defaults.engagement_cooldown_hours,
            ),
            engagement_min_delay_secs: env_parse(
                "ENGAGEMENT_MIN_DELAY_SECONDS",
                defaults.engagement_min_delay_secs,
            ),
            engagement_max_delay_secs: env_parse(
                "ENGAGEMENT_MAX_DELAY_SECONDS",
                defaults.engagement_max_delay_secs,
            ),
        }
    }

    /// Social credentials, or a configuration error naming what is missing.
    pub fn social_credentials(&self) -> ConfigResult<(&str, &str)> {
        let token = self
            .social_access_token
            .as_deref()
            .ok_or(ConfigError::MissingVar {
                name: "INSTAGRAM_ACCESS_TOKEN",
            })?;
        let account = self
            .social_account_id
            .as_deref()
            .ok_or(ConfigError::MissingVar {
                name: "INSTAGRAM_BUSINESS_ACCOUNT_ID",
            })?;
        Ok((token, account))
    }

    /// Persisted rotation-index file.
    pub fn variation_state_path(&self) -> PathBuf {
        self.data_dir.join("image_variation_state.json")
    }

    /// Persisted weekly arc state file.
    pub fn scene_memory_path(&self) -> PathBuf {
        self.data_dir.join("scene_memory.json")
    }

    /// Persisted engagement history file.
    pub fn engagement_history_path(&self) -> PathBuf {
        self.data_dir.join("engagement_history.json")
    }

    /// Seed target list file.
    pub fn targets_path(&self) -> PathBuf {
        self.data_dir.join("targets.json")
    }

    /// Persisted draft records file.
    pub fn drafts_path(&self) -> PathBuf {
        self.data_dir.join("drafts.json")
    }

    /// Directory for downloaded background references.
    pub fn references_dir(&self) -> PathBuf {
        self.asset_dir.join("images").join("references")
    }

    /// Directory for generated media.
    pub fn generated_dir(&self) -> PathBuf {
        self.asset_dir.join("images").join("generated")
    }

    /// Directory for preview files written in non-posting runs.
    pub fn preview_dir(&self) -> PathBuf {
        self.asset_dir.join("preview")
    }

    /// Directory for a persona's definition and reference images.
    pub fn persona_path(&self, slug: &str) -> PathBuf {
        self.persona_dir.join(slug)
    }
}

/// Create the directory skeleton the engine expects.
pub async fn ensure_structure(config: &Config) -> ConfigResult<()> {
    let needed = [
        config.data_dir.clone(),
        config.references_dir(),
        config.generated_dir(),
        config.preview_dir(),
        config.persona_dir.clone(),
    ];
    for dir in &needed {
        tokio::fs::create_dir_all(dir).await?;
        info!(dir = %dir.display(), "checked directory");
    }
    Ok(())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Replace anything that is not alphanumeric so a name is safe in a path.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(
            config.variation_state_path(),
            Path::new("data/image_variation_state.json")
        );
        assert_eq!(
            config.references_dir(),
            Path::new("assets/images/references")
        );
    }

    #[test]
    fn test_social_credentials_missing() {
        let config = Config::default();
        assert!(config.social_credentials().is_err());
    }

    #[test]
    fn test_social_credentials_present() {
        let config = Config {
            social_access_token: Some("token".to_string()),
            social_account_id: Some("1234".to_string()),
            ..Config::default()
        };
        let (token, account) = config.social_credentials().unwrap();
        assert_eq!(token, "token");
        assert_eq!(account, "1234");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("late night walk!"), "late_night_walk_");
    }
}
