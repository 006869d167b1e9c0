//! Pipeline orchestrator: one full content cycle.
//!
//! Stages run IDEA → ASSETS → CAPTION → PUBLISH_OR_PREVIEW → DONE. Every
//! stage failure is caught, logged, and reflected in the returned outcome
//! record; only a missing or invalid persona configuration escapes as an
//! error. A failed publish leaves the stored draft unpublished for a later
//! retry by draft id.

use crate::caption::generate_caption;
use crate::collab::{
    ImageGenerator, MediaType, PhotoSearch, PublishBackend, PublishReceipt, PublishStatus,
    TextGenerator,
};
use crate::config::Config;
use crate::drafts::{DraftStore, PostDraft};
use crate::engagement::EngagementEngine;
use crate::error::{PipelineError, PublishError};
use crate::idea::{generate_idea, LocationCandidate};
use crate::persona::{Persona, PersonaStore};
use crate::scene::SceneStore;
use crate::selection::{background_confidence, compose_scene, SceneInstructions};
use crate::variation::VariationState;
use chrono::{Local, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Background references fetched per cycle.
const MAX_BACKGROUND_REFS: usize = 3;

/// Recent drafts pulled for idea/caption context.
const RECENT_CONTEXT: usize = 6;

/// Daytime hours (inclusive) in which a post-publish engagement burst may
/// run.
const ENGAGEMENT_DAY_HOURS: (u32, u32) = (9, 22);

/// Options for one cycle.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// Publish to the platform instead of writing a preview.
    pub auto_post: bool,
    /// Kept for CLI compatibility; the API publisher ignores it.
    pub headless: bool,
    /// Run one engagement burst after a successful publish.
    pub trigger_engagement: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            auto_post: false,
            headless: true,
            trigger_engagement: false,
        }
    }
}

/// What a cycle produced. Always returned, however much failed.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub idea: Option<String>,
    pub location: Option<LocationCandidate>,
    pub caption: Option<String>,
    pub media_path: Option<PathBuf>,
    pub media_type: MediaType,
    pub draft_id: Option<Uuid>,
    pub posted: bool,
    /// Human-readable notes for every stage that degraded.
    pub stage_errors: Vec<String>,
}

impl Default for CycleOutcome {
    fn default() -> Self {
        Self {
            idea: None,
            location: None,
            caption: None,
            media_path: None,
            media_type: MediaType::Image,
            draft_id: None,
            posted: false,
            stage_errors: Vec::new(),
        }
    }
}

/// Filesystem locations the pipeline writes to.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub variation_state: PathBuf,
    pub generated_dir: PathBuf,
    pub preview_dir: PathBuf,
}

impl PipelinePaths {
    /// Derive from engine configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            variation_state: config.variation_state_path(),
            generated_dir: config.generated_dir(),
            preview_dir: config.preview_dir(),
        }
    }
}

/// The content pipeline and its collaborators.
pub struct ContentPipeline {
    personas: Arc<PersonaStore>,
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    photos: Arc<dyn PhotoSearch>,
    publisher: Arc<dyn PublishBackend>,
    drafts: Arc<dyn DraftStore>,
    scene: SceneStore,
    paths: PipelinePaths,
    engagement: Option<Arc<EngagementEngine>>,
}

impl ContentPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        personas: Arc<PersonaStore>,
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        photos: Arc<dyn PhotoSearch>,
        publisher: Arc<dyn PublishBackend>,
        drafts: Arc<dyn DraftStore>,
        scene: SceneStore,
        paths: PipelinePaths,
    ) -> Self {
        Self {
            personas,
            text,
            image,
            photos,
            publisher,
            drafts,
            scene,
            paths,
            engagement: None,
        }
    }

    /// Attach an engagement engine for post-publish bursts.
    pub fn with_engagement(mut self, engagement: Arc<EngagementEngine>) -> Self {
        self.engagement = Some(engagement);
        self
    }

    /// Run one full content cycle.
    ///
    /// Only a persona configuration problem is an error; collaborator
    /// failures degrade in place and are reported through the outcome.
    pub async fn run_cycle(
        &self,
        persona_slug: &str,
        options: &CycleOptions,
    ) -> Result<CycleOutcome, PipelineError> {
        let persona = self.personas.get(persona_slug).await?;
        info!(persona = %persona.display_name, "starting autonomous post cycle");

        let mut outcome = CycleOutcome::default();
        let mut rng = StdRng::from_entropy();

        let recent = self.drafts.recent(RECENT_CONTEXT).await.unwrap_or_default();
        let recent_ideas: Vec<String> = recent.iter().map(|d| d.idea.clone()).collect();
        let recent_captions: Vec<String> =
            recent.iter().filter_map(|d| d.caption.clone()).collect();

        // IDEA
        let today = Local::now().date_naive();
        let (idea, place) = generate_idea(
            self.text.as_ref(),
            &self.scene,
            &persona,
            &recent_ideas,
            today,
            Utc::now(),
            &mut rng,
        )
        .await;

        // ASSETS
        let background_refs = match self
            .photos
            .search(&place.keywords, MAX_BACKGROUND_REFS)
            .await
        {
            Ok(paths) => paths,
            Err(err) => {
                warn!(%err, "reference photo search failed");
                outcome.stage_errors.push(format!("photo search: {err}"));
                Vec::new()
            }
        };

        let confidence = background_confidence(!place.keywords.is_empty(), background_refs.len());
        let mut variation = VariationState::load(&self.paths.variation_state).await;
        let scene_instructions =
            compose_scene(&mut variation, place.shot_category, &place.name, confidence);
        let prompt = build_image_prompt(&persona, &idea, &place, &scene_instructions);

        let persona_refs = persona.reference_images().await;
        match self
            .image
            .generate(&persona_refs, &background_refs, &prompt)
            .await
        {
            Ok(bytes) => match self.write_media(&persona, &bytes).await {
                Ok(path) => {
                    info!(path = %path.display(), "image generated");
                    outcome.media_path = Some(path);
                }
                Err(err) => {
                    error!(%err, "could not write generated media");
                    outcome.stage_errors.push(format!("media write: {err}"));
                }
            },
            Err(err) => {
                error!(%err, "image generation failed");
                outcome.stage_errors.push(format!("image generation: {err}"));
            }
        }
        if let Err(err) = variation.save().await {
            warn!(%err, "failed to persist variation state");
        }

        // CAPTION
        let caption = generate_caption(
            self.text.as_ref(),
            &persona,
            &idea,
            Some(&place),
            &recent_captions,
            &mut rng,
        )
        .await;

        // Persist the draft whatever happened upstream; an unpublished
        // draft is the retry unit.
        let mut draft = PostDraft::new(&idea).with_caption(&caption);
        if let Some(path) = &outcome.media_path {
            draft = draft.with_media(path);
        }
        let draft_id = draft.id;
        match self.drafts.create(draft).await {
            Ok(()) => outcome.draft_id = Some(draft_id),
            Err(err) => {
                error!(%err, "could not store draft");
                outcome.stage_errors.push(format!("draft store: {err}"));
            }
        }

        // PUBLISH_OR_PREVIEW
        if options.auto_post {
            self.publish_stage(&mut outcome, &caption, draft_id, options)
                .await;
        } else {
            info!("preview mode: post not uploaded");
            if let Err(err) = self
                .write_preview(&persona, &idea, &place, &caption, &outcome)
                .await
            {
                warn!(%err, "failed to save preview metadata");
                outcome.stage_errors.push(format!("preview: {err}"));
            }
        }

        outcome.idea = Some(idea);
        outcome.location = Some(place);
        outcome.caption = Some(caption);
        info!(
            posted = outcome.posted,
            degraded = !outcome.stage_errors.is_empty(),
            "cycle complete"
        );
        Ok(outcome)
    }

    async fn publish_stage(
        &self,
        outcome: &mut CycleOutcome,
        caption: &str,
        draft_id: Uuid,
        options: &CycleOptions,
    ) {
        let Some(media_path) = outcome.media_path.clone() else {
            warn!("publish skipped: cycle produced no media");
            outcome
                .stage_errors
                .push("publish skipped: no media".to_string());
            return;
        };

        let media_type = MediaType::from_path(&media_path);
        outcome.media_type = media_type;

        match self.publisher.publish(&media_path, caption, media_type).await {
            Ok(receipt) if receipt.status == PublishStatus::Success => {
                if let Err(err) = self.drafts.mark_published(draft_id).await {
                    warn!(%err, "published but could not flag draft");
                }
                info!(detail = %receipt.detail, "posted successfully");
                outcome.posted = true;
            }
            Ok(receipt) => {
                warn!(status = ?receipt.status, detail = %receipt.detail, "publish not confirmed");
                outcome
                    .stage_errors
                    .push(format!("publish {:?}: {}", receipt.status, receipt.detail));
            }
            Err(err) => {
                error!(%err, "publish failed");
                outcome.stage_errors.push(format!("publish: {err}"));
            }
        }

        if options.trigger_engagement && outcome.posted {
            let hour = Local::now().hour();
            if (ENGAGEMENT_DAY_HOURS.0..=ENGAGEMENT_DAY_HOURS.1).contains(&hour) {
                if let Some(engagement) = &self.engagement {
                    info!("triggering a light engagement burst after posting");
                    let summary = engagement.run_cycle().await;
                    info!(succeeded = summary.succeeded, "follow-up engagement done");
                }
            } else {
                info!("engagement skipped: outside daytime window");
            }
        }
    }

    /// Publish a stored draft, defaulting to the newest unpublished one.
    pub async fn publish_draft(
        &self,
        draft_id: Option<Uuid>,
        headless: bool,
    ) -> Result<PublishReceipt, PublishError> {
        let draft = match draft_id {
            Some(id) => self.drafts.get(id).await?,
            None => self.drafts.latest_unpublished().await?,
        };
        let media_path = draft.media_path.clone().ok_or(PublishError::NoMedia)?;
        if !media_path.exists() {
            return Err(PublishError::MissingMedia { path: media_path });
        }
        if !headless {
            debug!("headed mode has no effect with the API publisher");
        }

        info!(draft = %draft.id, idea = %draft.idea, "publishing stored draft");
        let media_type = MediaType::from_path(&media_path);
        let receipt = self
            .publisher
            .publish(&media_path, draft.caption.as_deref().unwrap_or(""), media_type)
            .await?;

        if receipt.status == PublishStatus::Success {
            self.drafts.mark_published(draft.id).await?;
        }
        Ok(receipt)
    }

    async fn write_media(&self, persona: &Persona, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.paths.generated_dir).await?;
        let path = self
            .paths
            .generated_dir
            .join(format!("{}_{}.png", persona.id, Utc::now().timestamp()));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    async fn write_preview(
        &self,
        persona: &Persona,
        idea: &str,
        place: &LocationCandidate,
        caption: &str,
        outcome: &CycleOutcome,
    ) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.paths.preview_dir).await?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self
            .paths
            .preview_dir
            .join(format!("{}_{stamp}.txt", persona.id));

        let location_line = if place.description.is_empty() {
            place.name.clone()
        } else {
            format!("{} — {}", place.name, place.description)
        };
        let media_line = outcome
            .media_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no media generated)".to_string());

        let content = format!(
            "Idea: {idea}\n\nLocation: {location_line}\n\nCaption:\n{caption}\n\nMedia:\n{media_line}\n"
        );
        tokio::fs::write(&path, content).await?;
        info!(path = %path.display(), "preview saved");
        Ok(path)
    }
}

/// Assemble the full image-generation prompt: persona identity, location
/// grounding, the composed scene instructions, and the realism rules.
pub fn build_image_prompt(
    persona: &Persona,
    idea: &str,
    place: &LocationCandidate,
    scene: &SceneInstructions,
) -> String {
    let style = persona.appearance.aesthetic_keywords.join(", ");
    let hints = place
        .keywords
        .iter()
        .take(6)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{base}, casual lifestyle influencer in {city}. {identity} \
         Location: {location}. {description} \
         Style keywords: {style}. \
         Post idea: {idea}. \
         Scene hints: {hints}. \
         Do not change {name}'s facial structure, eye color, or signature hairstyle.\n\
         \n\
         {scene}\n\
         \n\
         Realism rules:\n\
         - MUST look like a real human photo.\n\
         - Skin texture visible, no plastic smoothing.\n\
         - Real shadows, real reflections, correct perspective.\n\
         - DO NOT make empty rooms.\n\
         - DO NOT use perfect studio lighting.\n\
         - DO NOT use cinematic vibes.\n\
         - DO NOT make symmetrical composition.\n\
         - Color grading must be a natural phone-camera look.\n\
         The background MUST match the real-world location {location}.",
        base = persona.appearance.summary,
        city = persona.home_city,
        identity = persona.identity_sentence(),
        location = place.name,
        description = place.description,
        style = style,
        idea = idea,
        hints = hints,
        name = persona.display_name,
        scene = scene.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcs::ShotCategory;
    use crate::persona::Appearance;

    #[test]
    fn test_build_image_prompt_contains_all_grounding() {
        let persona = Persona {
            id: "mina".to_string(),
            display_name: "Mina".to_string(),
            home_city: "Seoul".to_string(),
            appearance: Appearance {
                summary: "young woman with shoulder-length dark hair".to_string(),
                aesthetic_keywords: vec!["muted tones".to_string()],
                ..Default::default()
            },
            reference_dir: Default::default(),
        };
        let place = LocationCandidate {
            name: "Ttukseom river lawn".to_string(),
            description: "wind over the grass".to_string(),
            keywords: vec!["river".to_string(), "lawn".to_string()],
            shot_category: ShotCategory::StreetCasual,
            arc: "River Evenings".to_string(),
            arc_mood: "calm".to_string(),
            arc_beat: "blue hour walk".to_string(),
        };
        let scene = SceneInstructions {
            pose_id: "street_walk".to_string(),
            pose: "mid-stride walk".to_string(),
            outfit: "denim jacket".to_string(),
            environment: "pedestrians blurred behind".to_string(),
            imperfection: "soft natural grain".to_string(),
            camera: "Camera distance: 1.5-2.0 meters (friend-taken).".to_string(),
        };

        let prompt = build_image_prompt(&persona, "little walk in the city", &place, &scene);
        assert!(prompt.contains("Ttukseom river lawn"));
        assert!(prompt.contains("muted tones"));
        assert!(prompt.contains("Pose: mid-stride walk"));
        assert!(prompt.contains("Realism rules"));
        assert!(prompt.contains("Mina's facial structure") || prompt.contains("Do not change Mina"));
    }
}
