//! Engagement targeting, throttling, and execution.
//!
//! One cycle picks a bounded number of distinct (account, recent-post)
//! pairs, generates a tone-matched comment for each, and executes them one
//! at a time with unconditional pacing between successes, the primary
//! defense against platform rate limiting.

pub mod history;
pub mod targets;

pub use history::{
    EngagementHistory, EngagementRecord, Outcome, HISTORY_CAP, UNIQUE_COMMENT_WINDOW,
};
pub use targets::{discover_targets, load_seed_targets, Target, CATEGORY_PRIORITY};

use crate::collab::{CommentBackend, MediaPost, SocialDiscovery};
use crate::scene::SceneStore;
use chrono::{DateTime, Duration, Local, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Posts older than this are never engagement candidates.
pub const MAX_POST_AGE_DAYS: i64 = 10;

/// Recent posts fetched per account.
const RECENT_MEDIA_LIMIT: usize = 5;

/// Desired comments per burst.
const MIN_COMMENTS: usize = 3;
const MAX_COMMENTS: usize = 7;

/// Pause before the single comment retry.
const COMMENT_RETRY_PAUSE_SECS: u64 = 2;

/// Narrative context a comment is written under.
#[derive(Debug, Clone)]
pub struct EngagementContext {
    pub mood: String,
    pub beat: String,
}

/// A chosen (account, post) pair.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub account_id: String,
    pub username: Option<String>,
    pub category: Option<String>,
    pub post: MediaPost,
}

/// What one engagement cycle did.
#[derive(Debug, Clone, Default)]
pub struct EngagementSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped_non_unique: usize,
}

const BASE_COMMENTS: &[&str] = &[
    "Love the colors here — feels like a quiet moment in the middle of the city.",
    "I've walked past this place so many times, it always feels warm.",
    "This lighting is beautiful, evenings here always look like this.",
    "This spot looks so peaceful… adding it to my list.",
    "The textures feel so calm, like a pause from the rush outside.",
    "Feels like a soft pocket of the city, gentle and close.",
];

fn mood_overlay(mood: &str) -> Option<&'static str> {
    match mood {
        "reflective" => Some("Something about this looks thoughtful, like the city exhaling."),
        "playful" => Some("This looks so fun — makes me want to wander over right now."),
        "focused" => Some("Quiet scene, it feels like a good place to settle in for a while."),
        "hopeful" => Some("Light looks tender here, the kind of place that lifts the day."),
        _ => None,
    }
}

/// Craft a soft, curious comment matching the persona's current tone.
pub fn generate_comment(
    caption: &str,
    category: Option<&str>,
    context: &EngagementContext,
    rng: &mut impl Rng,
) -> String {
    let caption = caption.to_lowercase();
    let mut hints: Vec<&str> = Vec::new();
    if caption.contains("cafe") || caption.contains("café") || category == Some("cafe") {
        hints.push("this café feels gentle");
    }
    if caption.contains("night") || context.beat.contains("evening") {
        hints.push("soft evening light");
    }
    if caption.contains("river") || caption.contains("bridge") {
        hints.push("the river air");
    }

    let mut pool: Vec<String> = BASE_COMMENTS.iter().map(|c| c.to_string()).collect();
    if let Some(overlay) = mood_overlay(&context.mood) {
        pool.push(overlay.to_string());
    }
    if let Some(hint) = hints.choose(rng) {
        pool.push(format!("Love how {hint} sits in the scene."));
    }

    pool.choose(rng)
        .cloned()
        .unwrap_or_else(|| BASE_COMMENTS[0].to_string())
}

/// Apply the eligibility filter over prioritized targets until `desired`
/// candidates are found.
///
/// Per candidate post: the owning account must be out of cooldown, the
/// post must not already be in history, the post must be fresh enough, and
/// neither the account nor the post may repeat within this pass. At most
/// one post is taken per target.
pub async fn select_candidates(
    targets: Vec<Target>,
    discovery: &dyn SocialDiscovery,
    history: &EngagementHistory,
    desired: usize,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut chosen: Vec<Candidate> = Vec::new();
    let mut seen_accounts: HashSet<String> = HashSet::new();
    let mut seen_media: HashSet<String> = HashSet::new();
    let max_age = Duration::days(MAX_POST_AGE_DAYS);

    for target in targets {
        if chosen.len() >= desired {
            break;
        }

        let account_id = match &target.account_id {
            Some(id) => Some(id.clone()),
            None => match &target.username {
                Some(username) => discovery
                    .resolve_account(username)
                    .await
                    .ok()
                    .flatten(),
                None => None,
            },
        };
        let Some(account_id) = account_id else {
            continue;
        };

        if seen_accounts.contains(&account_id) {
            continue;
        }
        if history.account_in_cooldown(&account_id, cooldown, now) {
            continue;
        }

        let posts = match discovery.recent_media(&account_id, RECENT_MEDIA_LIMIT).await {
            Ok(posts) => posts,
            Err(err) => {
                warn!(%account_id, %err, "could not fetch recent media");
                continue;
            }
        };

        for post in posts {
            if post.id.is_empty() || seen_media.contains(&post.id) {
                continue;
            }
            if now - post.timestamp > max_age {
                continue;
            }
            if history.has_commented(&post.id) {
                continue;
            }

            seen_accounts.insert(account_id.clone());
            seen_media.insert(post.id.clone());
            chosen.push(Candidate {
                account_id: account_id.clone(),
                username: target.username.clone(),
                category: target.category.clone(),
                post,
            });
            break; // one post per target
        }
    }

    chosen
}

/// Post a comment, retrying exactly once after a short pause.
async fn post_with_retry(backend: &dyn CommentBackend, media_id: &str, text: &str) -> Outcome {
    match backend.comment(media_id, text).await {
        Ok(_) => Outcome::Success,
        Err(first) => {
            warn!(media_id, %first, "comment failed, retrying once");
            tokio::time::sleep(std::time::Duration::from_secs(COMMENT_RETRY_PAUSE_SECS)).await;
            match backend.comment(media_id, text).await {
                Ok(_) => Outcome::Success,
                Err(second) => {
                    error!(media_id, %second, "comment retry failed");
                    Outcome::Failed
                }
            }
        }
    }
}

/// The engagement engine and its wiring.
pub struct EngagementEngine {
    history_path: PathBuf,
    seeds_path: PathBuf,
    scene: SceneStore,
    discovery: Arc<dyn SocialDiscovery>,
    comments: Arc<dyn CommentBackend>,
    cooldown_hours: i64,
    min_delay_secs: u64,
    max_delay_secs: u64,
}

impl EngagementEngine {
    pub fn new(
        history_path: impl Into<PathBuf>,
        seeds_path: impl Into<PathBuf>,
        scene: SceneStore,
        discovery: Arc<dyn SocialDiscovery>,
        comments: Arc<dyn CommentBackend>,
        cooldown_hours: i64,
        min_delay_secs: u64,
        max_delay_secs: u64,
    ) -> Self {
        Self {
            history_path: history_path.into(),
            seeds_path: seeds_path.into(),
            scene,
            discovery,
            comments,
            cooldown_hours,
            min_delay_secs,
            max_delay_secs,
        }
    }

    /// Run one engagement burst.
    pub async fn run_cycle(&self) -> EngagementSummary {
        let mut rng = StdRng::from_entropy();
        self.run_cycle_with_rng(&mut rng).await
    }

    /// Run one engagement burst with an injected random source.
    pub async fn run_cycle_with_rng(&self, rng: &mut (impl Rng + Send)) -> EngagementSummary {
        let mut summary = EngagementSummary::default();
        let now = Utc::now();
        let today = Local::now().date_naive();

        let mut history = EngagementHistory::load(&self.history_path).await;
        let snap = self.scene.snapshot(today, rng).await;
        let context = EngagementContext {
            mood: snap.mood,
            beat: snap.beat,
        };

        let targets = discover_targets(&self.seeds_path, self.discovery.as_ref(), rng).await;
        let desired = rng.gen_range(MIN_COMMENTS..=MAX_COMMENTS);
        let candidates = select_candidates(
            targets,
            self.discovery.as_ref(),
            &history,
            desired,
            Duration::hours(self.cooldown_hours),
            now,
        )
        .await;

        if candidates.is_empty() {
            info!("no eligible posts found for engagement");
            return summary;
        }

        let min_delay = self.min_delay_secs;
        let max_delay = self.max_delay_secs.max(min_delay + 1);

        for candidate in candidates {
            let comment = generate_comment(
                &candidate.post.caption,
                candidate.category.as_deref(),
                &context,
                rng,
            );
            if !history.is_unique_comment(&comment) {
                summary.skipped_non_unique += 1;
                continue;
            }

            summary.attempted += 1;
            let outcome =
                post_with_retry(self.comments.as_ref(), &candidate.post.id, &comment).await;

            let record = EngagementRecord {
                account_id: candidate.account_id.clone(),
                username: candidate.username.clone(),
                media_id: candidate.post.id.clone(),
                comment,
                timestamp: Utc::now(),
                mood: context.mood.clone(),
                beat: context.beat.clone(),
                status: outcome,
            };
            if let Err(err) = history.append(record).await {
                warn!(%err, "failed to persist engagement history");
            }

            if outcome != Outcome::Success {
                continue;
            }
            summary.succeeded += 1;

            let delay = rng.gen_range(min_delay..=max_delay);
            info!(delay, "cooling down before next engagement");
            tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_comment_mood_overlay_reachable() {
        let context = EngagementContext {
            mood: "reflective".to_string(),
            beat: "quiet carriage scroll".to_string(),
        };
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen_overlay = false;
        for _ in 0..200 {
            let comment = generate_comment("", None, &context, &mut rng);
            if comment.contains("city exhaling") {
                seen_overlay = true;
            }
            assert!(!comment.is_empty());
        }
        assert!(seen_overlay);
    }

    #[test]
    fn test_generate_comment_caption_hint() {
        let context = EngagementContext {
            mood: "calm".to_string(),
            beat: String::new(),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen_hint = false;
        for _ in 0..200 {
            let comment = generate_comment("new cafe by the river", None, &context, &mut rng);
            if comment.starts_with("Love how") {
                seen_hint = true;
                break;
            }
        }
        assert!(seen_hint);
    }
}
