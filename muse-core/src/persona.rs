//! Persona definitions and the load-once persona store.
//!
//! A persona is validated when it is loaded: missing required fields fail
//! immediately as configuration errors instead of surfacing as half-built
//! prompts deep inside caption or image generation.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// How many persona reference images are attached to a generation request.
const MAX_PERSONA_REFS: usize = 3;

/// Visual identity fields used to keep generated imagery consistent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Appearance {
    /// One-line physical summary used as the prompt opener.
    pub summary: String,
    #[serde(default)]
    pub hair: Option<String>,
    #[serde(default)]
    pub eyes: Option<String>,
    #[serde(default)]
    pub skin_tone: Option<String>,
    #[serde(default)]
    pub distinct_features: Option<String>,
    #[serde(default)]
    pub facial_expression: Option<String>,
    /// Style keywords folded into image prompts.
    #[serde(default)]
    pub aesthetic_keywords: Vec<String>,
}

/// A validated persona definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    /// City the persona lives in; anchors idea and caption prompts.
    pub home_city: String,
    pub appearance: Appearance,
    /// Directory holding identity reference images, resolved at load.
    #[serde(skip)]
    pub reference_dir: PathBuf,
}

impl Persona {
    /// Load and validate a persona from `<root>/<slug>/persona.json`.
    pub async fn load(root: &Path, slug: &str) -> ConfigResult<Self> {
        let dir = root.join(slug);
        let file = dir.join("persona.json");
        if !file.exists() {
            return Err(ConfigError::PersonaNotFound {
                slug: slug.to_string(),
                path: file,
            });
        }

        let content = tokio::fs::read_to_string(&file).await?;
        let mut persona: Persona = serde_json::from_str(&content)?;
        persona.reference_dir = dir.join("references");
        persona.validate(slug)?;
        Ok(persona)
    }

    fn validate(&self, slug: &str) -> ConfigResult<()> {
        let required: [(&'static str, &str); 4] = [
            ("id", &self.id),
            ("display_name", &self.display_name),
            ("home_city", &self.home_city),
            ("appearance.summary", &self.appearance.summary),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::PersonaField {
                    slug: slug.to_string(),
                    field,
                });
            }
        }
        Ok(())
    }

    /// Identity sentence pinned into every image prompt so the generator
    /// does not drift on facial structure or signature features.
    pub fn identity_sentence(&self) -> String {
        fn val(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("unspecified")
        }
        let a = &self.appearance;
        format!(
            "{}'s hair: {}; eyes: {}; skin tone: {}; distinct features: {}; expression: {}.",
            self.display_name,
            val(&a.hair),
            val(&a.eyes),
            val(&a.skin_tone),
            val(&a.distinct_features),
            val(&a.facial_expression),
        )
    }

    /// Up to three identity reference images, sorted for stable ordering.
    pub async fn reference_images(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.reference_dir).await else {
            return paths;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        paths.truncate(MAX_PERSONA_REFS);
        paths
    }
}

/// Load-once persona cache with an explicit lifecycle.
///
/// Constructed at process start and passed by reference to the components
/// that need persona data. Personas are static during a single run, so the
/// first load wins.
pub struct PersonaStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, Arc<Persona>>>,
}

impl PersonaStore {
    /// Create a store rooted at the persona directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a persona, loading and validating it on first use.
    pub async fn get(&self, slug: &str) -> ConfigResult<Arc<Persona>> {
        {
            let cache = self.cache.read().await;
            if let Some(persona) = cache.get(slug) {
                return Ok(Arc::clone(persona));
            }
        }

        let persona = Arc::new(Persona::load(&self.root, slug).await?);
        let mut cache = self.cache.write().await;
        let entry = cache
            .entry(slug.to_string())
            .or_insert_with(|| Arc::clone(&persona));
        Ok(Arc::clone(entry))
    }
}
