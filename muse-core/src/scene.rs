//! Weekly narrative state machine.
//!
//! One record lives per calendar week, keyed by the Monday that starts it.
//! When the wall clock rolls into a new week the record is replaced
//! wholesale: the arc is re-rolled (never repeating the previous arc when
//! alternatives exist), the beat index resets, and the recency lists clear.
//! Within a week, beats and moods progress cyclically, not randomly, as
//! the beat index climbs.

use crate::arcs::{arc_by_name, choose_new_arc, StoryArc};
use crate::error::StateError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Maximum entries kept in each recency list.
pub const MAX_RECENT: usize = 6;

/// Persisted weekly arc state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMemory {
    /// Monday of the week this record covers.
    pub week_start: NaiveDate,
    /// Active arc name, once selected.
    pub arc: Option<String>,
    /// Monotonic beat counter; never reset within the week.
    pub beat_index: u32,
    /// Most recent location names, newest first.
    #[serde(default)]
    pub recent_locations: Vec<String>,
    /// Most recent moods, newest first.
    #[serde(default)]
    pub recent_moods: Vec<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl SceneMemory {
    /// A fresh record for the given week.
    pub fn fresh(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            arc: None,
            beat_index: 0,
            recent_locations: Vec::new(),
            recent_moods: Vec::new(),
            last_update: None,
        }
    }
}

/// Read-only projection of today's narrative context.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub arc: String,
    pub beat: String,
    pub mood: String,
    pub week_start: NaiveDate,
}

/// Date of the most recent Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Make sure the memory covers the current week and has an arc selected.
///
/// Week rollover replaces the record wholesale; the outgoing arc name is
/// remembered only to exclude it from the re-roll.
pub fn ensure_arc(
    memory: &mut SceneMemory,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> &'static StoryArc {
    let current_week = week_start(today);
    let mut previous: Option<String> = None;
    if memory.week_start != current_week {
        previous = memory.arc.take();
        *memory = SceneMemory::fresh(current_week);
    }

    if let Some(arc) = memory.arc.as_deref().and_then(arc_by_name) {
        return arc;
    }

    // No usable arc: either a fresh week, or a stored name that is no
    // longer in the catalog. Both count as the name to avoid repeating.
    let exclude = previous.or_else(|| memory.arc.clone());
    let arc = choose_new_arc(exclude.as_deref(), rng);
    memory.arc = Some(arc.name.to_string());
    memory.beat_index = 0;
    arc
}

/// Today's beat and mood, derived cyclically from the beat index.
pub fn snapshot(memory: &SceneMemory, arc: &StoryArc) -> SceneSnapshot {
    let index = memory.beat_index as usize;
    let beat = arc
        .beats
        .get(index % arc.beats.len().max(1))
        .copied()
        .unwrap_or("");
    let mood = arc
        .moods
        .get(index % arc.moods.len().max(1))
        .copied()
        .unwrap_or("calm");
    SceneSnapshot {
        arc: arc.name.to_string(),
        beat: beat.to_string(),
        mood: mood.to_string(),
        week_start: memory.week_start,
    }
}

/// Record a completed idea-generation pass: advance the beat and prepend
/// the new location and mood into their bounded recency lists.
pub fn record_beat(
    memory: &mut SceneMemory,
    arc: &StoryArc,
    location_name: &str,
    mood: &str,
    now: DateTime<Utc>,
) {
    memory.arc = Some(arc.name.to_string());
    memory.beat_index += 1;
    push_recent(&mut memory.recent_locations, location_name);
    push_recent(&mut memory.recent_moods, mood);
    memory.last_update = Some(now);
}

fn push_recent(list: &mut Vec<String>, value: &str) {
    list.insert(0, value.to_string());
    list.truncate(MAX_RECENT);
}

/// File-backed scene memory store.
#[derive(Debug, Clone)]
pub struct SceneStore {
    path: PathBuf,
}

impl SceneStore {
    /// Create a store bound to a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted record, or a fresh one when the file is missing
    /// or unreadable.
    pub async fn load(&self, today: NaiveDate) -> SceneMemory {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<SceneMemory>(&content) {
                Ok(memory) => memory,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "unreadable scene memory, recreating");
                    SceneMemory::fresh(week_start(today))
                }
            },
            Err(_) => SceneMemory::fresh(week_start(today)),
        }
    }

    /// Persist the record.
    pub async fn save(&self, memory: &SceneMemory) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(memory)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Read-only snapshot for the planner and captioner. Does not advance
    /// any index and does not persist the week-rollover it may observe.
    pub async fn snapshot(&self, today: NaiveDate, rng: &mut impl Rng) -> SceneSnapshot {
        let mut memory = self.load(today).await;
        let arc = ensure_arc(&mut memory, today, rng);
        snapshot(&memory, arc)
    }

    /// Path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
