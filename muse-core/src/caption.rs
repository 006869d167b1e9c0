//! Caption generation.
//!
//! One attempt against the text generator, then a deterministic template.
//! Captions are cheap to fall back on, so unlike idea generation there is
//! no retry loop here.

use crate::collab::TextGenerator;
use crate::idea::LocationCandidate;
use crate::persona::Persona;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

const CAPTION_TEMPERATURE: f32 = 0.8;
const CAPTION_MAX_TOKENS: u32 = 120;

const FALLBACK_TAGS: &[&str] = &["#CityDiaries", "#OOTD", "#SlowDays"];

/// Template caption used when the generator is unavailable.
pub fn fallback_caption(idea: &str, rng: &mut impl Rng) -> String {
    let tag = FALLBACK_TAGS.choose(rng).copied().unwrap_or("#CityDiaries");
    let mut chars = idea.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{capitalized} 💛 {tag}")
}

/// Generate a caption in the persona's voice.
pub async fn generate_caption(
    text: &dyn TextGenerator,
    persona: &Persona,
    idea: &str,
    place: Option<&LocationCandidate>,
    recent_captions: &[String],
    rng: &mut (impl Rng + Send),
) -> String {
    let system = format!(
        "You are {}, a female lifestyle influencer in {}. \
         Write short, casual, real captions. No metaphors.",
        persona.display_name, persona.home_city
    );

    let previous = recent_captions.join("\n");
    let location = place.map(|p| p.name.as_str()).unwrap_or("");
    let prompt = format!(
        "Recent captions:\n{previous}\n\n\
         Idea: {idea}\n\
         Location: {location}\n\
         Rules:\n\
         - 1-2 lines max\n\
         - No poetic language\n\
         - Max 3 emojis\n\
         - End with 2-3 natural hashtags\n"
    );

    match text
        .generate(Some(&system), &prompt, CAPTION_TEMPERATURE, CAPTION_MAX_TOKENS)
        .await
    {
        Ok(caption) if !caption.trim().is_empty() => caption.trim().to_string(),
        Ok(_) => fallback_caption(idea, rng),
        Err(err) => {
            warn!(%err, "caption generation failed, using template");
            fallback_caption(idea, rng)
        }
    }
}
