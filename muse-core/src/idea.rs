//! Idea and location generation.
//!
//! Asks the text generator to continue the weekly arc with a grounded
//! content beat, then enforces content policy on whatever comes back:
//! banned locations and thematic phrases are silently replaced with
//! deterministic fallbacks derived from the arc's own location list, and
//! ideas too similar to recent ones are rejected. This stage never fails:
//! worst case, the arc itself supplies the idea.

use crate::arcs::{
    contains_banned_phrase, infer_shot_category, is_banned_location, normalize,
    pick_shot_category, seed_ideas, ShotCategory, StoryArc,
};
use crate::collab::TextGenerator;
use crate::persona::Persona;
use crate::scene::{ensure_arc, record_beat, snapshot, SceneStore};
use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Attempts against the text generator before falling back.
const IDEA_ATTEMPTS: u32 = 3;
/// Pause between failed attempts.
const RETRY_PAUSE_MS: u64 = 1500;
/// Token-overlap ratio above which a candidate reads as a rerun.
const SIMILARITY_LIMIT: f32 = 0.6;

const IDEA_TEMPERATURE: f32 = 0.8;
const IDEA_MAX_TOKENS: u32 = 180;

/// A vetted idea location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub shot_category: ShotCategory,
    pub arc: String,
    pub arc_mood: String,
    pub arc_beat: String,
}

#[derive(Deserialize)]
struct IdeaPayload {
    #[serde(default)]
    idea: String,
    #[serde(default)]
    location: Option<LocationPayload>,
}

#[derive(Deserialize, Default)]
struct LocationPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    shot_category: Option<String>,
}

/// Lowercased alphabetic token set of a text.
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphabetic() {
            current.push(c);
        } else if !current.is_empty() {
            tokens.insert(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.insert(current);
    }
    tokens
}

/// Whether a candidate idea reuses a banned phrase or overlaps a recent
/// idea's tokens too heavily.
pub fn too_similar(candidate: &str, recent_tokens: &[HashSet<String>]) -> bool {
    let normalized = normalize(candidate);
    if contains_banned_phrase(&normalized) {
        return true;
    }

    let tokens = tokenize(&normalized);
    if tokens.is_empty() {
        return false;
    }
    recent_tokens.iter().any(|recent| {
        let shared = tokens.intersection(recent).count();
        shared as f32 / tokens.len().max(1) as f32 > SIMILARITY_LIMIT
    })
}

/// Pull the outermost JSON object out of generated text.
fn extract_json(raw: &str) -> Option<IdeaPayload> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Deterministic location built from the arc's own candidates.
fn fallback_location(
    arc: &StoryArc,
    category: ShotCategory,
    mood: &str,
    beat: &str,
    rng: &mut impl Rng,
) -> LocationCandidate {
    let name = arc
        .locations
        .choose(rng)
        .copied()
        .unwrap_or("a quiet side street");
    LocationCandidate {
        name: name.to_string(),
        description: format!("Scene for the {} arc.", arc.name),
        keywords: vec!["city".to_string(), "street".to_string(), category.key().to_string()],
        shot_category: category,
        arc: arc.name.to_string(),
        arc_mood: mood.to_string(),
        arc_beat: beat.to_string(),
    }
}

fn build_prompt(
    persona: &Persona,
    arc: &StoryArc,
    beat: &str,
    mood: &str,
    category: ShotCategory,
    seed: &str,
    recent_ideas: &[String],
) -> String {
    let locations = arc.locations.join(", ");
    let prev: Vec<&str> = recent_ideas.iter().take(3).map(String::as_str).collect();
    format!(
        "You are {name}'s narrative planner. Continue her {city} weekly arc with a grounded content beat.\n\
         \n\
         Arc: {arc_name} — {arc_desc}\n\
         Today's beat: {beat}\n\
         Mood keywords: {mood}\n\
         Location candidates: {locations}\n\
         Shot category: {category}\n\
         Recent ideas: {prev}\n\
         Seed to riff on: \"{seed}\"\n\
         \n\
         Return ONLY compact JSON:\n\
         {{\n\
           \"idea\": \"4-10 word idea, present tense, no poetry\",\n\
           \"location\": {{\n\
             \"name\": \"realistic {city} spot\",\n\
             \"description\": \"one short clause about the moment\",\n\
             \"keywords\": [\"k1\",\"k2\",\"k3\"],\n\
             \"shot_category\": \"{category}\"\n\
           }}\n\
         }}",
        name = persona.display_name,
        city = persona.home_city,
        arc_name = arc.name,
        arc_desc = arc.description,
        beat = beat,
        mood = mood,
        locations = locations,
        category = category.key(),
        prev = prev.join(" | "),
        seed = seed,
    )
}

/// Generate today's idea and location, updating scene memory on the way
/// out. Infallible by design: collaborator failures degrade to arc-derived
/// fallbacks.
pub async fn generate_idea(
    text: &dyn TextGenerator,
    scene_store: &SceneStore,
    persona: &Persona,
    recent_ideas: &[String],
    today: NaiveDate,
    now: DateTime<Utc>,
    rng: &mut (impl Rng + Send),
) -> (String, LocationCandidate) {
    let recent_tokens: Vec<HashSet<String>> = recent_ideas
        .iter()
        .map(|idea| tokenize(&normalize(idea)))
        .collect();

    let mut memory = scene_store.load(today).await;
    let arc = ensure_arc(&mut memory, today, rng);
    let snap = snapshot(&memory, arc);
    let beat = snap.beat.clone();
    let mood = snap.mood.clone();

    let category = pick_shot_category(Some(arc.shot_bias), rng);
    let seed = seed_ideas(category).choose(rng).copied().unwrap_or("soft city day");
    let prompt = build_prompt(persona, arc, &beat, &mood, category, seed, recent_ideas);

    let mut idea: Option<String> = None;
    let mut place: Option<LocationCandidate> = None;

    for attempt in 1..=IDEA_ATTEMPTS {
        match text
            .generate(None, &prompt, IDEA_TEMPERATURE, IDEA_MAX_TOKENS)
            .await
        {
            Ok(raw) => {
                let Some(payload) = extract_json(&raw) else {
                    warn!(attempt, "idea response held no JSON object");
                    continue;
                };
                if too_similar(&payload.idea, &recent_tokens) {
                    warn!(attempt, candidate = %payload.idea, "idea too close to a recent one");
                    continue;
                }
                let idea_text = payload.idea.trim().to_string();
                place = payload.location.map(|loc| {
                    // Use the explicit tag when the catalog recognizes it;
                    // otherwise infer from the idea and location keywords.
                    let shot_category = loc
                        .shot_category
                        .as_deref()
                        .and_then(ShotCategory::parse)
                        .unwrap_or_else(|| infer_shot_category(&idea_text, &loc.keywords));
                    LocationCandidate {
                        shot_category,
                        name: loc.name,
                        description: loc.description,
                        keywords: loc.keywords,
                        arc: arc.name.to_string(),
                        arc_mood: mood.clone(),
                        arc_beat: beat.clone(),
                    }
                });
                idea = Some(idea_text).filter(|i| !i.is_empty());
                if idea.is_some() {
                    break;
                }
            }
            Err(err) if err.is_transient() => {
                warn!(attempt, %err, "idea generation attempt failed");
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_PAUSE_MS)).await;
            }
            Err(err) => {
                warn!(%err, "idea generation unavailable, using fallback");
                break;
            }
        }
    }

    let idea = idea.unwrap_or_else(|| {
        let spot = arc.locations.choose(rng).copied().unwrap_or("the city");
        format!("{beat} near {spot}")
    });

    let mut place = place
        .unwrap_or_else(|| fallback_location(arc, category, &mood, &beat, rng));

    // Content policy: banned names are replaced outright, repeats in the
    // recency list just get a freshness note.
    if is_banned_location(&place.name) {
        warn!(rejected = %place.name, "candidate location is on the deny-list");
        place = fallback_location(arc, category, &mood, &beat, rng);
    }
    if memory.recent_locations.iter().any(|l| l == &place.name) {
        place.description.push_str("; choose a new angle to keep it fresh");
    }

    record_beat(&mut memory, arc, &place.name, &mood, now);
    if let Err(err) = scene_store.save(&memory).await {
        warn!(%err, "failed to persist scene memory");
    }

    info!(idea = %idea, category = category.key(), arc = arc.name, beat = %beat, "idea ready");
    info!(location = %place.name, mood = %mood, "location ready");
    (idea, place)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTextGenerator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn persona() -> Persona {
        Persona {
            id: "mina".to_string(),
            display_name: "Mina".to_string(),
            home_city: "Seoul".to_string(),
            appearance: Default::default(),
            reference_dir: Default::default(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Late-night walk, by the RIVER");
        assert!(tokens.contains("late"));
        assert!(tokens.contains("river"));
        assert!(!tokens.contains("late-night"));
    }

    #[test]
    fn test_too_similar_by_overlap() {
        let recent = vec![tokenize("quiet walk along the river path")];
        assert!(too_similar("quiet walk along the river", &recent));
        assert!(!too_similar("gym session before breakfast", &recent));
    }

    #[test]
    fn test_too_similar_by_banned_phrase() {
        assert!(too_similar("chasing light over rooftops", &[]));
    }

    #[test]
    fn test_extract_json_from_noisy_text() {
        let raw = "Sure! Here you go:\n{\"idea\": \"slow start kind of day\", \"location\": {\"name\": \"somewhere\"}}\nHope that helps.";
        let payload = extract_json(raw).unwrap();
        assert_eq!(payload.idea, "slow start kind of day");
        assert_eq!(payload.location.unwrap().name, "somewhere");
    }

    #[tokio::test]
    async fn test_generated_idea_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SceneStore::new(dir.path().join("scene.json"));
        let text = MockTextGenerator::with_responses(vec![Ok(
            r#"{"idea": "warm bench by the window", "location": {"name": "Seongsu warehouse café", "description": "corner table", "keywords": ["cafe","window"], "shot_category": "selfie_morning"}}"#.to_string(),
        )]);

        let mut rng = StdRng::seed_from_u64(5);
        let (idea, place) = generate_idea(
            &text,
            &store,
            &persona(),
            &[],
            today(),
            Utc::now(),
            &mut rng,
        )
        .await;

        assert_eq!(idea, "warm bench by the window");
        assert_eq!(place.name, "Seongsu warehouse café");
        assert_eq!(place.shot_category, ShotCategory::SelfieMorning);

        let memory = store.load(today()).await;
        assert_eq!(memory.beat_index, 1);
        assert_eq!(memory.recent_locations[0], "Seongsu warehouse café");
    }

    #[tokio::test]
    async fn test_fallback_on_generator_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SceneStore::new(dir.path().join("scene.json"));
        let text = MockTextGenerator::always_failing();

        let mut rng = StdRng::seed_from_u64(5);
        let (idea, place) = generate_idea(
            &text,
            &store,
            &persona(),
            &[],
            today(),
            Utc::now(),
            &mut rng,
        )
        .await;

        assert!(idea.contains(" near "));
        assert!(!place.name.is_empty());
        assert!(!is_banned_location(&place.name));
    }

    #[tokio::test]
    async fn test_banned_location_replaced() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SceneStore::new(dir.path().join("scene.json"));

        for seed in 0..50 {
            let text = MockTextGenerator::with_responses(vec![Ok(
                r#"{"idea": "palace gates at golden hour", "location": {"name": "Gyeongbokgung", "description": "tourist crowd", "keywords": ["palace"]}}"#.to_string(),
            )]);
            let mut rng = StdRng::seed_from_u64(seed);
            let (_, place) = generate_idea(
                &text,
                &store,
                &persona(),
                &[],
                today(),
                Utc::now(),
                &mut rng,
            )
            .await;
            assert!(!is_banned_location(&place.name));
        }
    }

    #[tokio::test]
    async fn test_repeat_location_gets_freshness_note() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SceneStore::new(dir.path().join("scene.json"));
        let response = r#"{"idea": "same corner once more", "location": {"name": "Mangwon market backstreets", "description": "narrow aisle", "keywords": ["market"]}}"#;

        let mut rng = StdRng::seed_from_u64(1);
        let text = MockTextGenerator::with_responses(vec![Ok(response.to_string())]);
        let _ = generate_idea(&text, &store, &persona(), &[], today(), Utc::now(), &mut rng).await;

        let text = MockTextGenerator::with_responses(vec![Ok(response.to_string())]);
        let (_, place) = generate_idea(
            &text,
            &store,
            &persona(),
            &["different thing entirely".to_string()],
            today(),
            Utc::now(),
            &mut rng,
        )
        .await;
        assert!(place.description.contains("choose a new angle"));
    }
}
