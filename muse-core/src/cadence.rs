//! Cadence planner: how many posting events happen today, when, and when
//! the engagement bursts land around them.
//!
//! All randomness flows through an injected `Rng` so plans are fully
//! reproducible under a seeded generator.

use crate::scene::SceneSnapshot;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// A named time-of-day window in local hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingWindow {
    pub name: &'static str,
    pub start_hour: u32,
    pub end_hour: u32,
}

/// Fixed catalog of posting windows.
pub const WINDOWS: &[PostingWindow] = &[
    PostingWindow { name: "sunrise", start_hour: 7, end_hour: 10 },
    PostingWindow { name: "late_morning", start_hour: 10, end_hour: 12 },
    PostingWindow { name: "afternoon", start_hour: 13, end_hour: 16 },
    PostingWindow { name: "evening", start_hour: 18, end_hour: 21 },
    PostingWindow { name: "night", start_hour: 21, end_hour: 23 },
];

/// Base engagement window in local hours.
pub const ENGAGEMENT_WINDOW: (u32, u32) = (9, 22);

/// Minimum spacing between an engagement burst and any other planned event.
pub const ENGAGEMENT_BUFFER_MINUTES: i64 = 45;

/// Hours-since-last-post threshold for the primary second-post rule.
const STALE_HOURS: f32 = 28.0;
/// Engagement threshold paired with [`STALE_HOURS`].
const STALE_ENGAGEMENT: f32 = 0.35;
/// Engagement threshold for the warm-audience rule.
const WARM_ENGAGEMENT: f32 = 0.55;
/// Hours-since-last-post paired with [`WARM_ENGAGEMENT`].
const WARM_HOURS: f32 = 18.0;
/// Unconditional chance of a bonus second post.
const BONUS_POST_CHANCE: f64 = 0.15;

/// Observable signal from a recent post, newest first in any list.
#[derive(Debug, Clone)]
pub struct PostSignal {
    pub likes: u32,
    pub comments: u32,
    pub followers: u32,
    pub created_at: DateTime<Utc>,
}

/// One scheduled event in a day plan.
#[derive(Debug, Clone)]
pub struct PlannedEvent {
    pub label: String,
    pub at: NaiveDateTime,
}

/// A full day's schedule.
#[derive(Debug, Clone, Default)]
pub struct DayPlan {
    pub posts: Vec<PlannedEvent>,
    pub engagements: Vec<PlannedEvent>,
}

/// Estimate audience warmth from recent posts, clamped to `[0.1, 0.9]`.
///
/// No data at all reads as neutral rather than cold.
pub fn engagement_hint(recent: &[PostSignal]) -> f32 {
    if recent.is_empty() {
        return 0.5;
    }

    let scores: Vec<f32> = recent
        .iter()
        .map(|p| {
            let followers = p.followers.max(1) as f32;
            (p.likes as f32 + p.comments as f32 * 2.0) / followers
        })
        .collect();

    let avg = scores.iter().sum::<f32>() / scores.len() as f32;
    (avg * 3.0).clamp(0.1, 0.9)
}

/// Hours since the newest known post; a large sentinel when unknown.
pub fn hours_since_last_post(recent: &[PostSignal], now: DateTime<Utc>) -> f32 {
    match recent.first() {
        Some(latest) => {
            let seconds = (now - latest.created_at).num_seconds();
            seconds as f32 / 3600.0
        }
        None => 999.0,
    }
}

/// Decide today's post count (1 or 2).
pub fn decide_post_count(recent: &[PostSignal], now: DateTime<Utc>, rng: &mut impl Rng) -> usize {
    let engagement = engagement_hint(recent);
    let hours_since = hours_since_last_post(recent, now);

    if hours_since > STALE_HOURS && engagement > STALE_ENGAGEMENT {
        return 2;
    }
    if engagement > WARM_ENGAGEMENT && hours_since > WARM_HOURS {
        return 2;
    }
    if rng.gen_bool(BONUS_POST_CHANCE) {
        return 2;
    }
    1
}

/// Window names that match the current storyline mood, best first.
pub fn preferred_windows(snapshot: &SceneSnapshot) -> Vec<&'static str> {
    let mood = snapshot.mood.as_str();
    let beat = snapshot.beat.as_str();

    if beat.contains("night") || matches!(mood, "reflective" | "restless") {
        vec!["evening", "night"]
    } else if beat.contains("study") || matches!(mood, "focused" | "hopeful") {
        vec!["sunrise", "late_morning", "afternoon"]
    } else if matches!(mood, "playful" | "adventurous") {
        vec!["late_morning", "afternoon", "evening"]
    } else {
        vec!["late_morning", "evening"]
    }
}

/// Select `count` distinct windows: priority order first, random unused
/// windows to cover any shortfall.
pub fn choose_windows(
    count: usize,
    snapshot: &SceneSnapshot,
    rng: &mut impl Rng,
) -> Vec<&'static PostingWindow> {
    let priority = preferred_windows(snapshot);
    let rank = |window: &PostingWindow| {
        priority
            .iter()
            .position(|name| *name == window.name)
            .unwrap_or(priority.len())
    };

    let mut candidates: Vec<&'static PostingWindow> = WINDOWS.iter().collect();
    candidates.sort_by_key(|w| rank(w));

    let mut selected: Vec<&'static PostingWindow> = candidates.iter().copied().take(count).collect();

    while selected.len() < count {
        let remaining: Vec<&'static PostingWindow> = WINDOWS
            .iter()
            .filter(|w| !selected.iter().any(|s| s.name == w.name))
            .collect();
        match remaining.choose(rng) {
            Some(window) => selected.push(window),
            None => break,
        }
    }

    selected
}

/// Draw a uniformly random instant inside a window on the given date.
pub fn random_time_in_window(
    window: &PostingWindow,
    date: NaiveDate,
    rng: &mut impl Rng,
) -> NaiveDateTime {
    let start = at_hour(date, window.start_hour);
    let end = at_hour(date, window.end_hour);
    let span = (end - start).num_seconds().max(1);
    start + chrono::Duration::seconds(rng.gen_range(0..=span))
}

/// Whether a candidate instant keeps the buffer from every existing one.
fn is_far_from(candidate: NaiveDateTime, others: &[NaiveDateTime]) -> bool {
    others
        .iter()
        .all(|t| (candidate - *t).num_minutes().abs() > ENGAGEMENT_BUFFER_MINUTES)
}

/// Pick up to `desired` engagement instants inside the mood-adjusted
/// engagement window, each buffered from every post and from each other.
///
/// Candidates are resampled under a bounded attempt budget; when it runs
/// out, fewer bursts than desired are accepted.
pub fn engagement_slots(
    desired: usize,
    snapshot: &SceneSnapshot,
    post_times: &[NaiveDateTime],
    date: NaiveDate,
    rng: &mut impl Rng,
) -> Vec<NaiveDateTime> {
    let (mut start_hour, mut end_hour) = ENGAGEMENT_WINDOW;
    match snapshot.mood.as_str() {
        "reflective" | "restless" => end_hour = (end_hour + 1).min(23),
        "playful" | "adventurous" => start_hour = start_hour.saturating_sub(1).max(8),
        _ => {}
    }
    let window = PostingWindow {
        name: "engagement",
        start_hour,
        end_hour,
    };

    let mut slots: Vec<NaiveDateTime> = Vec::new();
    let mut attempts = 0;
    while slots.len() < desired && attempts < desired * 6 {
        let candidate = random_time_in_window(&window, date, rng);
        if is_far_from(candidate, post_times) && is_far_from(candidate, &slots) {
            slots.push(candidate);
        }
        attempts += 1;
    }
    slots
}

/// Build the full plan for one day.
pub fn plan_day(
    recent: &[PostSignal],
    snapshot: &SceneSnapshot,
    date: NaiveDate,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> DayPlan {
    let post_count = decide_post_count(recent, now, rng);
    let windows = choose_windows(post_count, snapshot, rng);

    let posts: Vec<PlannedEvent> = windows
        .iter()
        .map(|window| PlannedEvent {
            label: window.name.to_string(),
            at: random_time_in_window(window, date, rng),
        })
        .collect();

    let post_times: Vec<NaiveDateTime> = posts.iter().map(|p| p.at).collect();
    let desired = rng.gen_range(2..=5);
    let engagements = engagement_slots(desired, snapshot, &post_times, date, rng)
        .into_iter()
        .enumerate()
        .map(|(i, at)| PlannedEvent {
            label: format!("engagement-{}", i + 1),
            at,
        })
        .collect();

    DayPlan { posts, engagements }
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}
