//! Option tables for every selection axis, per shot category.
//!
//! Pose and environment options carry a `min_confidence` threshold:
//! options that lean on real background detail (storefronts, crowds,
//! legible signage) unlock only when enough reference material was
//! fetched. Outfits and imperfection cues are unconditional.

use super::Gated;

/// How the camera is held for a pose.
#[derive(Debug, Clone, Copy)]
pub enum CameraKind {
    /// Front camera at arm's length.
    Selfie { distance_cm: &'static str },
    /// Handheld by a friend.
    FriendShot { distance_m: &'static str },
}

/// Per-pose camera directives. The list-valued sub-fields are cycled
/// independently under `camera:<pose_id>:<subfield>` keys.
#[derive(Debug, Clone, Copy)]
pub struct CameraSpec {
    pub kind: CameraKind,
    pub framing: &'static str,
    pub hands: Option<&'static str>,
    pub angles: &'static [&'static str],
    pub expressions: &'static [&'static str],
    pub motion: &'static [&'static str],
    pub clip_pacing: &'static [&'static str],
}

/// A pose option with its camera spec.
#[derive(Debug, Clone, Copy)]
pub struct PoseOption {
    pub id: &'static str,
    pub text: &'static str,
    pub min_confidence: f32,
    pub camera: CameraSpec,
}

impl Gated for PoseOption {
    fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}

/// An environment option; `{location}` is interpolated with the candidate
/// location name.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentOption {
    pub id: &'static str,
    pub text: &'static str,
    pub min_confidence: f32,
}

impl Gated for EnvironmentOption {
    fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}

/// Option sets for one shot category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryOptions {
    pub poses: &'static [PoseOption],
    pub environments: &'static [EnvironmentOption],
    pub outfits: &'static [&'static str],
}

/// Imperfection cues shared across categories; real phone photos always
/// have one.
pub const IMPERFECTIONS: &[&str] = &[
    "slight hand shake",
    "soft natural grain",
    "tiny flyaway hair strands",
    "subtle uneven lighting on face",
    "slight blur on one edge",
    "minor color noise from indoor lights",
];

const DEFAULT_CLIP_PACING: &[&str] = &[
    "slow push-in for reel",
    "gentle pan left",
    "handheld sway",
];

const SELFIE_MORNING_POSES: &[PoseOption] = &[
    PoseOption {
        id: "morning_armlength",
        text: "arm-length selfie, slightly tilted phone, face and shoulders in frame",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "35-45" },
            framing: "face and shoulders, slight headroom",
            hands: None,
            angles: &["phone a little above eye level", "tilted a few degrees left"],
            expressions: &["sleepy half smile", "eyes just opened", "mid-yawn caught late"],
            motion: &["still, leaning on counter", "small step toward window light"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "morning_windowseat",
        text: "seated selfie by a window, mug in the other hand, phone below eye level",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "30-40" },
            framing: "waist-up, window edge visible",
            hands: Some("one hand around the mug"),
            angles: &["phone slightly below eye level", "three-quarter turn to window"],
            expressions: &["soft unfocused gaze", "quiet smile into the cup"],
            motion: &["steam drifting", "fingers tapping the mug"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "morning_counter",
        text: "counter-side candid while ordering, looking back over shoulder",
        min_confidence: 0.5,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "1.5-2.0" },
            framing: "waist-up, counter and menu board behind",
            hands: None,
            angles: &["slightly low, from the queue", "level, from the side"],
            expressions: &["caught mid-sentence", "grin at being photographed"],
            motion: &["reaching for the cup", "turning back to the counter"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
];

const SELFIE_GYM_POSES: &[PoseOption] = &[
    PoseOption {
        id: "gym_mirror",
        text: "gym mirror selfie, phone partially covering chin, relaxed stance",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "40-55" },
            framing: "three-quarter body in mirror",
            hands: Some("free hand on hip or adjusting strap"),
            angles: &["phone at chest height", "slightly angled to hide flash glare"],
            expressions: &["post-set flush", "neutral checking-form face"],
            motion: &["towel over shoulder", "shaking out arms between sets"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "gym_bench",
        text: "seated on a bench between sets, arm-length selfie, honest fatigue",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "35-45" },
            framing: "face and shoulders, rack blurred behind",
            hands: None,
            angles: &["slightly above, looking up", "level, head tilted back on the rest"],
            expressions: &["out-of-breath smile", "wiped brow, eyes closed"],
            motion: &["chest still rising from the set", "reaching for the water bottle"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "gym_floor",
        text: "friend-taken shot mid-stretch on the mats, other gym-goers behind",
        min_confidence: 0.5,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "2.0-2.5" },
            framing: "full body on the mat, equipment in frame",
            hands: None,
            angles: &["low angle across the floor", "standing, looking down obliquely"],
            expressions: &["concentrating on the stretch", "laughing at the camera"],
            motion: &["mid-stretch hold", "rolling up the mat"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
];

const SELFIE_MIRROR_POSES: &[PoseOption] = &[
    PoseOption {
        id: "mirror_elevator",
        text: "elevator mirror selfie, phone at chest height not covering face",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "50-70" },
            framing: "three-quarter body, elevator panel visible",
            hands: Some("phone held two-handed at chest"),
            angles: &["straight on", "slight hip turn, weight on one leg"],
            expressions: &["deadpan fit check", "small self-aware smile"],
            motion: &["still before the doors open", "fixing a sleeve"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "mirror_hallway",
        text: "hallway mirror selfie, outfit fully in frame, bag on shoulder",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "60-80" },
            framing: "full body, door frame visible",
            hands: Some("one hand in pocket"),
            angles: &["phone tilted slightly down", "leaning into the mirror a little"],
            expressions: &["checking the outfit not the camera", "half smile"],
            motion: &["adjusting the bag strap", "heel lifted mid-step"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
];

const STREET_CASUAL_POSES: &[PoseOption] = &[
    PoseOption {
        id: "street_walk",
        text: "friend-taken candid from across the sidewalk, natural mid-stride walk",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "1.5-2.0" },
            framing: "waist-up, street receding behind",
            hands: None,
            angles: &["level from the side", "slightly low but subtle"],
            expressions: &["looking slightly away from camera", "caught laughing"],
            motion: &["mid-stride", "hair moved by passing bus"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "street_railing",
        text: "leaning on a railing, relaxed, one hand fixing hair",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "1.5-2.5" },
            framing: "three-quarter body, railing diagonal through frame",
            hands: Some("one hand fixing hair"),
            angles: &["level", "low across the railing"],
            expressions: &["soft smile", "squinting into late light"],
            motion: &["still lean", "turning toward the view"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "street_crosswalk",
        text: "walking selfie with motion blur on the crossing crowd behind",
        min_confidence: 0.3,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "35-45" },
            framing: "face and shoulders, crosswalk stripes below",
            hands: None,
            angles: &["arm extended high", "level, slightly rotated"],
            expressions: &["mid-step grin", "mock-serious commuter face"],
            motion: &["walking pace blur", "crowd parting behind"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "street_storefront",
        text: "standing by a storefront with legible local signage behind",
        min_confidence: 0.7,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "2.0-3.0" },
            framing: "full body, storefront filling the background",
            hands: None,
            angles: &["level from across the narrow street", "slightly high from a step"],
            expressions: &["reading the menu in the window", "glance back at the camera"],
            motion: &["still", "pushing the door half open"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
];

const COZY_NIGHT_POSES: &[PoseOption] = &[
    PoseOption {
        id: "night_desk",
        text: "desk selfie lit by laptop glow, hair loosely tied",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "30-40" },
            framing: "face and shoulders, screen light from below",
            hands: None,
            angles: &["slightly below eye level", "tilted, cheek on palm"],
            expressions: &["tired but content", "blue-light squint"],
            motion: &["screen glow flicker", "stretching arms overhead"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "night_sofa",
        text: "curled on the sofa under a blanket, phone at arm's length",
        min_confidence: 0.0,
        camera: CameraSpec {
            kind: CameraKind::Selfie { distance_cm: "35-45" },
            framing: "face and blanket, lamp halo behind",
            hands: Some("blanket pulled to chin"),
            angles: &["from above, lying back", "level, head on armrest"],
            expressions: &["sleepy", "small grin at something on the phone"],
            motion: &["still", "toes wiggling under the blanket"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
    PoseOption {
        id: "night_window",
        text: "by the window with city lights outside, reflection ghosting on the glass",
        min_confidence: 0.5,
        camera: CameraSpec {
            kind: CameraKind::FriendShot { distance_m: "1.0-1.5" },
            framing: "profile against the window, bokeh skyline",
            hands: None,
            angles: &["from inside the room, level", "slightly behind, over the shoulder"],
            expressions: &["far-off look", "breath fogging the glass"],
            motion: &["tracing the skyline with a finger", "still"],
            clip_pacing: DEFAULT_CLIP_PACING,
        },
    },
];

const SELFIE_MORNING_ENVIRONMENTS: &[EnvironmentOption] = &[
    EnvironmentOption {
        id: "morning_soft_interior",
        text: "soft morning interior near {location}, warm window light, mugs and crumbs on the table",
        min_confidence: 0.0,
    },
    EnvironmentOption {
        id: "morning_counter_crowd",
        text: "inside {location}, customers working on laptops softly blurred behind",
        min_confidence: 0.5,
    },
    EnvironmentOption {
        id: "morning_street_front",
        text: "just outside {location}, morning delivery bikes and wet pavement",
        min_confidence: 0.7,
    },
];

const SELFIE_GYM_ENVIRONMENTS: &[EnvironmentOption] = &[
    EnvironmentOption {
        id: "gym_generic_floor",
        text: "gym floor near {location}, racks and plates out of focus",
        min_confidence: 0.0,
    },
    EnvironmentOption {
        id: "gym_busy_floor",
        text: "at {location}, one or two other gym visitors casually in the background",
        min_confidence: 0.5,
    },
];

const SELFIE_MIRROR_ENVIRONMENTS: &[EnvironmentOption] = &[
    EnvironmentOption {
        id: "mirror_home",
        text: "apartment hallway mirror near {location}, coat hooks and keys visible",
        min_confidence: 0.0,
    },
    EnvironmentOption {
        id: "mirror_elevator_brass",
        text: "elevator at {location}, brushed metal doors and floor indicator glow",
        min_confidence: 0.3,
    },
];

const STREET_CASUAL_ENVIRONMENTS: &[EnvironmentOption] = &[
    EnvironmentOption {
        id: "street_generic",
        text: "a side street near {location}, pedestrians walking behind slightly blurred",
        min_confidence: 0.0,
    },
    EnvironmentOption {
        id: "street_signage",
        text: "at {location}, street shops and signs with real local text, cars passing softly blurred",
        min_confidence: 0.5,
    },
    EnvironmentOption {
        id: "street_landmark",
        text: "directly at {location}, the recognizable storefronts matching the reference photos",
        min_confidence: 0.8,
    },
];

const COZY_NIGHT_ENVIRONMENTS: &[EnvironmentOption] = &[
    EnvironmentOption {
        id: "night_room",
        text: "dim room near {location}, one warm lamp, charger cables on the desk",
        min_confidence: 0.0,
    },
    EnvironmentOption {
        id: "night_city_glow",
        text: "window view toward {location}, neon and traffic light smeared by the glass",
        min_confidence: 0.5,
    },
];

const SELFIE_MORNING_OUTFITS: &[&str] = &[
    "oversized knit cardigan over a sleep tee",
    "cream hoodie, hair clipped up",
    "soft pastel sweater with pajama shorts",
    "linen shirt half tucked, glasses on",
];

const SELFIE_GYM_OUTFITS: &[&str] = &[
    "athleisure set in a muted palette",
    "loose tank over leggings, towel on shoulder",
    "zip-up jacket half open over sports top",
    "faded tee and bike shorts, hair in a low bun",
];

const SELFIE_MIRROR_OUTFITS: &[&str] = &[
    "cream blazer over a simple top",
    "white crop top with a denim skirt",
    "oversized knitted sweater with a tote bag",
    "monochrome set with chunky sneakers",
];

const STREET_CASUAL_OUTFITS: &[&str] = &[
    "casual streetwear jacket with slim jeans",
    "long coat over a hoodie, canvas tote",
    "pink hoodie and ponytail casual look",
    "cardigan and pleated skirt with flats",
    "denim jacket over a striped tee",
];

const COZY_NIGHT_OUTFITS: &[&str] = &[
    "worn-in pajama set, blanket over shoulders",
    "oversized tee and fuzzy socks",
    "hoodie with sleeves pulled over hands",
    "loose sweats, hair down and messy",
];

const SELFIE_MORNING_OPTIONS: CategoryOptions = CategoryOptions {
    poses: SELFIE_MORNING_POSES,
    environments: SELFIE_MORNING_ENVIRONMENTS,
    outfits: SELFIE_MORNING_OUTFITS,
};

const SELFIE_GYM_OPTIONS: CategoryOptions = CategoryOptions {
    poses: SELFIE_GYM_POSES,
    environments: SELFIE_GYM_ENVIRONMENTS,
    outfits: SELFIE_GYM_OUTFITS,
};

const SELFIE_MIRROR_OPTIONS: CategoryOptions = CategoryOptions {
    poses: SELFIE_MIRROR_POSES,
    environments: SELFIE_MIRROR_ENVIRONMENTS,
    outfits: SELFIE_MIRROR_OUTFITS,
};

const STREET_CASUAL_OPTIONS: CategoryOptions = CategoryOptions {
    poses: STREET_CASUAL_POSES,
    environments: STREET_CASUAL_ENVIRONMENTS,
    outfits: STREET_CASUAL_OUTFITS,
};

const COZY_NIGHT_OPTIONS: CategoryOptions = CategoryOptions {
    poses: COZY_NIGHT_POSES,
    environments: COZY_NIGHT_ENVIRONMENTS,
    outfits: COZY_NIGHT_OUTFITS,
};

/// Option tables for a shot category.
pub fn options_for(category: crate::arcs::ShotCategory) -> &'static CategoryOptions {
    use crate::arcs::ShotCategory::*;
    match category {
        SelfieMorning => &SELFIE_MORNING_OPTIONS,
        SelfieGym => &SELFIE_GYM_OPTIONS,
        SelfieMirror => &SELFIE_MIRROR_OPTIONS,
        StreetCasual => &STREET_CASUAL_OPTIONS,
        CozyNight => &COZY_NIGHT_OPTIONS,
    }
}
