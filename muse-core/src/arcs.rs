//! Weekly story arc catalog, shot categories, and content policy lists.
//!
//! Arcs are week-scoped narrative themes: each bundles candidate locations,
//! story beats, and moods, plus the shot category the arc tends to produce.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Style of generated imagery; drives which pose/outfit/environment option
/// sets apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotCategory {
    SelfieMorning,
    SelfieGym,
    SelfieMirror,
    StreetCasual,
    CozyNight,
}

impl ShotCategory {
    /// All categories, in catalog order.
    pub const ALL: [ShotCategory; 5] = [
        ShotCategory::SelfieMorning,
        ShotCategory::SelfieGym,
        ShotCategory::SelfieMirror,
        ShotCategory::StreetCasual,
        ShotCategory::CozyNight,
    ];

    /// Stable key used in rotation-state composite keys.
    pub fn key(&self) -> &'static str {
        match self {
            ShotCategory::SelfieMorning => "selfie_morning",
            ShotCategory::SelfieGym => "selfie_gym",
            ShotCategory::SelfieMirror => "selfie_mirror",
            ShotCategory::StreetCasual => "street_casual",
            ShotCategory::CozyNight => "cozy_night",
        }
    }

    /// Parse a category key, e.g. from generated idea payloads.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == raw)
    }

    /// Default category when nothing recognizable is tagged or inferred.
    pub fn default_category() -> Self {
        ShotCategory::StreetCasual
    }
}

/// A week-scoped narrative theme.
#[derive(Debug, Clone, Copy)]
pub struct StoryArc {
    pub name: &'static str,
    pub description: &'static str,
    pub locations: &'static [&'static str],
    pub beats: &'static [&'static str],
    pub moods: &'static [&'static str],
    pub shot_bias: ShotCategory,
}

/// Fixed catalog of weekly arcs.
pub const ARC_CATALOG: &[StoryArc] = &[
    StoryArc {
        name: "Cafe Hopping Week",
        description: "A week of journaling in neighborhood cafés, chasing soft daylight and quiet corner tables.",
        locations: &[
            "Yeonnam-dong side cafés",
            "Seongsu warehouse café",
            "Mangwon market backstreets",
            "Haebangchon hillside windows",
            "Ikseon-dong hanok courtyard",
        ],
        beats: &[
            "slow morning journal",
            "noon refill and people watching",
            "rainy window pause",
            "late latte art study",
            "weekend brunch sprawl",
        ],
        moods: &["sleepy", "focused", "reflective", "hopeful"],
        shot_bias: ShotCategory::SelfieMorning,
    },
    StoryArc {
        name: "River Evenings",
        description: "Evening walks along the river, letting dusk and humidity soften the day.",
        locations: &[
            "Banpo bridge underpass",
            "Ttukseom river lawn",
            "Yeouido willow path",
            "Jamwon cycling road",
            "Seonyudo footbridge",
        ],
        beats: &[
            "blue hour walk",
            "post-edit stretch",
            "bridge lights pause",
            "convenience store ramyeon break",
            "last ferry breeze",
        ],
        moods: &["melancholy", "curious", "calm"],
        shot_bias: ShotCategory::CozyNight,
    },
    StoryArc {
        name: "Metro Lines",
        description: "Commuting across transfer stations, watching strangers and tunnel light, collecting feelings between stops.",
        locations: &[
            "Line 2 circle platform",
            "Express bus terminal concourse",
            "Hapjeong transfer stairs",
            "City hall underground arcade",
            "First carriage window seat",
        ],
        beats: &[
            "morning commute",
            "crowded noon ride",
            "quiet carriage scroll",
            "rain on train windows",
            "late ride home",
        ],
        moods: &["observant", "introspective", "restless"],
        shot_bias: ShotCategory::StreetCasual,
    },
    StoryArc {
        name: "Study Sprint Week",
        description: "Language test prep with vocab cards, library café sessions, and small talk practice with baristas.",
        locations: &[
            "University library café",
            "Study lounge window desk",
            "Park bench under ginkgo trees",
            "Community center reading room",
            "Apartment desk by the window",
        ],
        beats: &[
            "morning vocab warmup",
            "lunch break flashcards",
            "tired afternoon review",
            "evening mock test",
            "weekend catch-up session",
        ],
        moods: &["hopeful", "focused", "tired", "determined"],
        shot_bias: ShotCategory::SelfieMirror,
    },
    StoryArc {
        name: "Mall Weekends",
        description: "Escaping the weather by roaming malls, trying snacks, and riding escalators for the light.",
        locations: &[
            "Starfield library atrium",
            "COEX aquarium corridor",
            "Times Square rooftop garden",
            "The Hyundai food hall",
            "IFC mall glass escalators",
        ],
        beats: &[
            "morning escalator ride",
            "window shopping pause",
            "food court break",
            "arcade detour",
            "night roof deck",
        ],
        moods: &["playful", "restless", "cosy"],
        shot_bias: ShotCategory::StreetCasual,
    },
];

/// Locations the persona never posts from, matched case-insensitively as
/// exact names or substrings.
pub const BANNED_LOCATIONS: &[&str] = &["gyeongbokgung", "myeongdong shopping street"];

/// Overused thematic phrases that get candidate ideas rejected.
pub const BANNED_PHRASES: &[&str] = &[
    "city of contrasts",
    "neon dreams",
    "lost in the moment",
    "chasing light",
    "urban symphony",
    "where past meets present",
];

/// Seed phrases used to anchor idea prompts, per shot category.
pub fn seed_ideas(category: ShotCategory) -> &'static [&'static str] {
    match category {
        ShotCategory::SelfieMorning => &[
            "morning coffee run",
            "slow start kind of day",
            "sunlight on sleepy eyes",
            "first coffee then life",
        ],
        ShotCategory::SelfieGym => &[
            "today's gym fit",
            "post workout glow",
            "back to the gym",
            "leg day again lol",
        ],
        ShotCategory::SelfieMirror => &[
            "mirror fit check",
            "getting ready outfit",
            "elevator selfie again",
            "study break stretch",
        ],
        ShotCategory::StreetCasual => &[
            "little walk in the city",
            "afternoon street vibes",
            "wandering the neighborhood",
            "soft city day",
        ],
        ShotCategory::CozyNight => &[
            "late night laptop time",
            "cozy night in",
            "sleepy but online",
            "pjs and blue light",
        ],
    }
}

static ARC_INDEX: Lazy<HashMap<&'static str, &'static StoryArc>> =
    Lazy::new(|| ARC_CATALOG.iter().map(|arc| (arc.name, arc)).collect());

/// Look up an arc by name.
pub fn arc_by_name(name: &str) -> Option<&'static StoryArc> {
    ARC_INDEX.get(name).copied()
}

/// Choose a new weekly arc, excluding the immediately prior arc name when
/// alternatives exist.
pub fn choose_new_arc(previous: Option<&str>, rng: &mut impl Rng) -> &'static StoryArc {
    let pool: Vec<&'static StoryArc> = ARC_CATALOG
        .iter()
        .filter(|arc| Some(arc.name) != previous)
        .collect();
    if pool.is_empty() {
        // Single-arc catalog: repetition is the only option.
        return &ARC_CATALOG[0];
    }
    pool.choose(rng).copied().unwrap_or(&ARC_CATALOG[0])
}

/// Pick today's shot category, weighting the arc's bias by inserting it as
/// an extra candidate.
pub fn pick_shot_category(preferred: Option<ShotCategory>, rng: &mut impl Rng) -> ShotCategory {
    let mut candidates: Vec<ShotCategory> = ShotCategory::ALL.to_vec();
    if let Some(preferred) = preferred {
        candidates.insert(0, preferred);
    }
    candidates
        .choose(rng)
        .copied()
        .unwrap_or_else(ShotCategory::default_category)
}

/// Whether a location name hits the deny-list (case-insensitive exact or
/// substring match).
pub fn is_banned_location(name: &str) -> bool {
    let normalized = normalize(name);
    BANNED_LOCATIONS
        .iter()
        .any(|banned| normalized == *banned || normalized.contains(banned))
}

/// Whether text contains a banned thematic phrase.
pub fn contains_banned_phrase(text: &str) -> bool {
    let normalized = normalize(text);
    BANNED_PHRASES.iter().any(|p| normalized.contains(p))
}

/// Lowercase and collapse interior whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

const GYM_TERMS: &[&str] = &["gym", "workout", "fitness", "sweat", "training", "run"];
const NIGHT_TERMS: &[&str] = &["night", "evening", "cozy", "late", "neon", "midnight"];
const MIRROR_TERMS: &[&str] = &["mirror", "outfit", "fit check", "dress", "elevator"];
const MORNING_TERMS: &[&str] = &["morning", "coffee", "cafe", "sunrise", "breakfast", "brunch"];

/// Infer a shot category from idea text and location keywords.
///
/// Term sets are checked in specificity order; nothing matching falls back
/// to the default category.
pub fn infer_shot_category(idea: &str, keywords: &[String]) -> ShotCategory {
    let mut haystack = normalize(idea);
    for keyword in keywords {
        haystack.push(' ');
        haystack.push_str(&normalize(keyword));
    }

    let hits = |terms: &[&str]| terms.iter().any(|t| haystack.contains(t));
    if hits(GYM_TERMS) {
        ShotCategory::SelfieGym
    } else if hits(NIGHT_TERMS) {
        ShotCategory::CozyNight
    } else if hits(MIRROR_TERMS) {
        ShotCategory::SelfieMirror
    } else if hits(MORNING_TERMS) {
        ShotCategory::SelfieMorning
    } else {
        ShotCategory::default_category()
    }
}
