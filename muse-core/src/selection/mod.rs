//! Content selection engine.
//!
//! Chooses visually varied, non-repetitive generation instructions for a
//! shot category. Two strategies coexist and are deliberately kept apart:
//!
//! - **Confidence-gated cyclic selection** (poses, environments): the
//!   rotation index only advances when the indexed option's confidence
//!   threshold is actually met. Progress is earned, so low-confidence
//!   calls cannot starve high-confidence options of their turn.
//! - **Plain cyclic selection** (outfits, imperfection cues, camera
//!   sub-axes): strict round-robin, always advancing.

mod camera;
mod catalog;

pub use camera::camera_instructions;
pub use catalog::{
    options_for, CameraKind, CameraSpec, CategoryOptions, EnvironmentOption, PoseOption,
    IMPERFECTIONS,
};

use crate::arcs::ShotCategory;
use crate::variation::VariationState;

/// Base confidence granted before any evidence is considered.
const CONFIDENCE_BASE: f32 = 0.2;
/// Bonus when the location carries search keywords.
const CONFIDENCE_KEYWORD_BONUS: f32 = 0.2;
/// Bonus per fetched reference image.
const CONFIDENCE_PER_REFERENCE: f32 = 0.2;
/// Reference images beyond this stop contributing.
const CONFIDENCE_REFERENCE_CAP: usize = 3;

/// An option that may be locked behind a confidence threshold.
pub trait Gated {
    /// Minimum background confidence required to use this option.
    fn min_confidence(&self) -> f32;
}

/// Background confidence in `[0, 1]`: how much real reference material
/// backs this generation request.
pub fn background_confidence(has_keywords: bool, reference_count: usize) -> f32 {
    let mut confidence = CONFIDENCE_BASE;
    if has_keywords {
        confidence += CONFIDENCE_KEYWORD_BONUS;
    }
    confidence += CONFIDENCE_PER_REFERENCE * reference_count.min(CONFIDENCE_REFERENCE_CAP) as f32;
    confidence.clamp(0.0, 1.0)
}

/// Confidence-gated cyclic selection.
///
/// If the indexed option's threshold is met it is chosen and the rotation
/// advances. Otherwise the list is scanned in order for the first option
/// the current confidence unlocks, returned *without* advancing, so the
/// cycle position waits for a future call with more reference material.
/// When nothing is unlocked the first option is the unconditional fallback.
pub fn select_gated<'a, T: Gated>(
    state: &mut VariationState,
    key: &str,
    options: &'a [T],
    confidence: f32,
) -> Option<&'a T> {
    let first = options.first()?;
    let index = state.get_index(key, options.len());
    let indexed = &options[index];

    if confidence >= indexed.min_confidence() {
        state.advance(key, options.len());
        return Some(indexed);
    }

    Some(
        options
            .iter()
            .find(|option| confidence >= option.min_confidence())
            .unwrap_or(first),
    )
}

/// Plain cyclic selection: return the indexed option and always advance.
pub fn select_cyclic<'a>(
    state: &mut VariationState,
    key: &str,
    options: &'a [&'static str],
) -> &'a str {
    if options.is_empty() {
        return "";
    }
    let index = state.get_index(key, options.len());
    state.advance(key, options.len());
    options[index]
}

/// The composed instruction set handed to the image generator as prompt
/// content. Descriptive context, not an image.
#[derive(Debug, Clone)]
pub struct SceneInstructions {
    pub pose_id: String,
    pub pose: String,
    pub outfit: String,
    pub environment: String,
    pub imperfection: String,
    pub camera: String,
}

impl SceneInstructions {
    /// Render as the prompt block appended to the base image prompt.
    pub fn render(&self) -> String {
        format!(
            "Pose: {}\nOutfit variation: {}\nEnvironment: {}\nImperfection cue: {}\nCamera: {}",
            self.pose, self.outfit, self.environment, self.imperfection, self.camera
        )
    }
}

/// Run one full selection pass for a shot category.
///
/// Rotation keys are per axis and category (`pose:street_casual`,
/// `outfit:cozy_night`, ...); camera sub-axes key off the chosen pose so
/// different poses keep independent rotation state.
pub fn compose_scene(
    state: &mut VariationState,
    category: ShotCategory,
    location_name: &str,
    confidence: f32,
) -> SceneInstructions {
    let options = options_for(category);

    let pose = select_gated(
        state,
        &format!("pose:{}", category.key()),
        options.poses,
        confidence,
    );
    let environment = select_gated(
        state,
        &format!("environment:{}", category.key()),
        options.environments,
        confidence,
    );
    let outfit = select_cyclic(state, &format!("outfit:{}", category.key()), options.outfits);
    let imperfection = select_cyclic(state, "imperfection", IMPERFECTIONS);

    let (pose_id, pose_text, camera) = match pose {
        Some(pose) => (
            pose.id.to_string(),
            pose.text.to_string(),
            camera_instructions(state, pose),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    let environment = environment
        .map(|e| e.text.replace("{location}", location_name))
        .unwrap_or_default();

    SceneInstructions {
        pose_id,
        pose: pose_text,
        outfit: outfit.to_string(),
        environment,
        imperfection: imperfection.to_string(),
        camera,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opt {
        id: &'static str,
        min_confidence: f32,
    }

    impl Gated for Opt {
        fn min_confidence(&self) -> f32 {
            self.min_confidence
        }
    }

    const OPTS: &[Opt] = &[
        Opt { id: "a", min_confidence: 0.0 },
        Opt { id: "b", min_confidence: 0.5 },
        Opt { id: "c", min_confidence: 0.0 },
    ];

    #[test]
    fn test_background_confidence() {
        assert_eq!(background_confidence(false, 0), 0.2);
        assert_eq!(background_confidence(true, 0), 0.4);
        assert_eq!(background_confidence(true, 3), 1.0);
        // The fourth image contributes nothing.
        assert_eq!(background_confidence(true, 4), 1.0);
    }

    #[test]
    fn test_gated_advances_on_earned_use() {
        let mut state = VariationState::empty("unused.json");
        let chosen = select_gated(&mut state, "pose:test", OPTS, 0.9).unwrap();
        assert_eq!(chosen.id, "a");
        assert_eq!(state.get_index("pose:test", OPTS.len()), 1);
    }

    #[test]
    fn test_gated_miss_returns_fallback_without_advancing() {
        let mut state = VariationState::empty("unused.json");
        state.advance("pose:test", OPTS.len()); // index now points at "b"

        let chosen = select_gated(&mut state, "pose:test", OPTS, 0.0).unwrap();
        assert_eq!(chosen.id, "a");
        // Cycle position preserved: still pointing at "b".
        assert_eq!(state.get_index("pose:test", OPTS.len()), 1);
    }

    #[test]
    fn test_gated_never_passes_locked_option_at_zero_confidence() {
        let mut state = VariationState::empty("unused.json");
        state.advance("pose:test", OPTS.len());
        for _ in 0..20 {
            let chosen = select_gated(&mut state, "pose:test", OPTS, 0.0).unwrap();
            assert_eq!(chosen.id, "a");
            assert_eq!(state.get_index("pose:test", OPTS.len()), 1);
        }
    }

    #[test]
    fn test_gated_unconditional_fallback() {
        let locked: &[Opt] = &[
            Opt { id: "x", min_confidence: 0.5 },
            Opt { id: "y", min_confidence: 0.9 },
        ];
        let mut state = VariationState::empty("unused.json");
        let chosen = select_gated(&mut state, "pose:test", locked, 0.1).unwrap();
        assert_eq!(chosen.id, "x");
        assert_eq!(state.get_index("pose:test", locked.len()), 0);
    }

    #[test]
    fn test_cyclic_always_advances() {
        let mut state = VariationState::empty("unused.json");
        let options: &[&'static str] = &["one", "two", "three"];
        let picks: Vec<&str> = (0..6)
            .map(|_| select_cyclic(&mut state, "outfit:test", options))
            .collect();
        assert_eq!(picks, vec!["one", "two", "three", "one", "two", "three"]);
    }

    #[test]
    fn test_compose_scene_interpolates_location() {
        let mut state = VariationState::empty("unused.json");
        let scene = compose_scene(
            &mut state,
            ShotCategory::StreetCasual,
            "Mangwon market backstreets",
            1.0,
        );
        assert!(scene.environment.contains("Mangwon market backstreets"));
        assert!(!scene.pose.is_empty());
        assert!(!scene.outfit.is_empty());
        assert!(!scene.camera.is_empty());
        assert!(scene.render().contains("Pose: "));
    }

    #[test]
    fn test_compose_scene_cycles_outfits_each_pass() {
        let mut state = VariationState::empty("unused.json");
        let first = compose_scene(&mut state, ShotCategory::CozyNight, "desk", 0.0);
        let second = compose_scene(&mut state, ShotCategory::CozyNight, "desk", 0.0);
        // Outfits round-robin regardless of what the gated axes do.
        assert_ne!(first.outfit, second.outfit);
    }
}
