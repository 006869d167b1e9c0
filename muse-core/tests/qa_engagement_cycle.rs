//! Engagement cycle tests: eligibility filtering, pacing, and history.

use chrono::{Duration, Utc};
use muse_core::collab::MediaPost;
use muse_core::engagement::{
    EngagementEngine, EngagementHistory, EngagementRecord, Outcome, Target,
};
use muse_core::testing::{MockCommentBackend, MockDiscovery};
use muse_core::SceneStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

fn post(id: &str, hours_ago: i64) -> MediaPost {
    MediaPost {
        id: id.to_string(),
        caption: String::new(),
        timestamp: Utc::now() - Duration::hours(hours_ago),
    }
}

fn write_seeds(root: &Path, targets: &[Target]) -> std::path::PathBuf {
    let path = root.join("targets.json");
    std::fs::write(&path, serde_json::to_string_pretty(targets).unwrap()).unwrap();
    path
}

fn seed(username: &str, category: &str) -> Target {
    Target {
        username: Some(username.to_string()),
        account_id: None,
        category: Some(category.to_string()),
        source: None,
    }
}

fn engine(
    root: &Path,
    discovery: MockDiscovery,
    comments: Arc<MockCommentBackend>,
    cooldown_hours: i64,
) -> EngagementEngine {
    EngagementEngine::new(
        root.join("history.json"),
        root.join("targets.json"),
        SceneStore::new(root.join("scene.json")),
        Arc::new(discovery),
        comments,
        cooldown_hours,
        0,
        0,
    )
}

#[tokio::test]
async fn one_pass_never_double_comments_a_post() {
    let dir = tempfile::TempDir::new().unwrap();
    // Two seed entries resolving to the same account, plus a distinct one.
    write_seeds(
        dir.path(),
        &[
            seed("cafe_owner", "cafe"),
            seed("cafe_owner_alt", "cafe"),
            seed("runner", "lifestyle"),
        ],
    );

    let discovery = MockDiscovery::new()
        .with_account("cafe_owner", "acct-cafe")
        .with_account("cafe_owner_alt", "acct-cafe")
        .with_account("runner", "acct-runner")
        .with_media("acct-cafe", post("media-1", 5))
        .with_media("acct-cafe", post("media-2", 6))
        .with_media("acct-runner", post("media-3", 7));

    let comments = Arc::new(MockCommentBackend::succeeding());
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 24);

    let mut rng = StdRng::seed_from_u64(42);
    engine.run_cycle_with_rng(&mut rng).await;

    let history = EngagementHistory::load(dir.path().join("history.json")).await;
    let media_ids: Vec<&str> = history.entries().iter().map(|e| e.media_id.as_str()).collect();
    let unique: HashSet<&str> = media_ids.iter().copied().collect();
    assert_eq!(media_ids.len(), unique.len(), "duplicate media in one pass");

    // The duplicate account contributed at most one comment.
    let cafe_count = history
        .entries()
        .iter()
        .filter(|e| e.account_id == "acct-cafe")
        .count();
    assert!(cafe_count <= 1);
}

#[tokio::test]
async fn cooldown_excludes_recently_contacted_accounts() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("cafe_owner", "cafe"), seed("runner", "lifestyle")]);

    // Account contacted one hour ago, cooldown four hours.
    let mut history = EngagementHistory::load(dir.path().join("history.json")).await;
    history
        .append(EngagementRecord {
            account_id: "acct-cafe".to_string(),
            username: Some("cafe_owner".to_string()),
            media_id: "old-media".to_string(),
            comment: "earlier comment".to_string(),
            timestamp: Utc::now() - Duration::hours(1),
            mood: "calm".to_string(),
            beat: String::new(),
            status: Outcome::Success,
        })
        .await
        .unwrap();

    let discovery = MockDiscovery::new()
        .with_account("cafe_owner", "acct-cafe")
        .with_account("runner", "acct-runner")
        .with_media("acct-cafe", post("media-1", 2))
        .with_media("acct-runner", post("media-2", 2));

    let comments = Arc::new(MockCommentBackend::succeeding());
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 4);

    let mut rng = StdRng::seed_from_u64(7);
    engine.run_cycle_with_rng(&mut rng).await;

    for (media_id, _) in comments.comments() {
        assert_ne!(media_id, "media-1", "cooldown account was contacted");
    }
}

#[tokio::test]
async fn expired_cooldown_makes_account_eligible_again() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("cafe_owner", "cafe")]);

    // Contact five hours ago with a four-hour window: eligible.
    let mut history = EngagementHistory::load(dir.path().join("history.json")).await;
    history
        .append(EngagementRecord {
            account_id: "acct-cafe".to_string(),
            username: Some("cafe_owner".to_string()),
            media_id: "old-media".to_string(),
            comment: "earlier comment".to_string(),
            timestamp: Utc::now() - Duration::hours(5),
            mood: "calm".to_string(),
            beat: String::new(),
            status: Outcome::Success,
        })
        .await
        .unwrap();

    let discovery = MockDiscovery::new()
        .with_account("cafe_owner", "acct-cafe")
        .with_media("acct-cafe", post("media-new", 2));

    let comments = Arc::new(MockCommentBackend::succeeding());
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 4);

    let mut rng = StdRng::seed_from_u64(9);
    engine.run_cycle_with_rng(&mut rng).await;

    assert!(comments
        .comments()
        .iter()
        .any(|(media_id, _)| media_id == "media-new"));
}

#[tokio::test]
async fn stale_posts_are_never_candidates() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("archivist", "photographer")]);

    let discovery = MockDiscovery::new()
        .with_account("archivist", "acct-old")
        .with_media("acct-old", post("ancient", 24 * 20));

    let comments = Arc::new(MockCommentBackend::succeeding());
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 24);

    let mut rng = StdRng::seed_from_u64(11);
    let summary = engine.run_cycle_with_rng(&mut rng).await;

    assert_eq!(summary.attempted, 0);
    assert!(comments.comments().is_empty());
}

#[tokio::test]
async fn comment_failure_retries_once_then_records_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("runner", "lifestyle")]);

    let discovery = MockDiscovery::new()
        .with_account("runner", "acct-runner")
        .with_media("acct-runner", post("media-1", 3));

    // Both the first attempt and the retry fail.
    let comments = Arc::new(MockCommentBackend::failing_first(2));
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 24);

    let mut rng = StdRng::seed_from_u64(3);
    let summary = engine.run_cycle_with_rng(&mut rng).await;

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 0);

    // The failure is still recorded, immediately.
    let history = EngagementHistory::load(dir.path().join("history.json")).await;
    assert_eq!(history.entries().len(), 1);
    assert_eq!(history.entries()[0].status, Outcome::Failed);
}

#[tokio::test]
async fn single_failure_recovers_on_retry() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("runner", "lifestyle")]);

    let discovery = MockDiscovery::new()
        .with_account("runner", "acct-runner")
        .with_media("acct-runner", post("media-1", 3));

    let comments = Arc::new(MockCommentBackend::failing_first(1));
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 24);

    let mut rng = StdRng::seed_from_u64(3);
    let summary = engine.run_cycle_with_rng(&mut rng).await;

    assert_eq!(summary.succeeded, 1);
    let history = EngagementHistory::load(dir.path().join("history.json")).await;
    assert_eq!(history.entries()[0].status, Outcome::Success);
}

#[tokio::test]
async fn saturated_comment_pool_skips_instead_of_repeating() {
    let dir = tempfile::TempDir::new().unwrap();
    write_seeds(dir.path(), &[seed("runner", "lifestyle")]);

    // Preload the recent window with every comment the pool can produce
    // for caption-less posts.
    let mut history = EngagementHistory::load(dir.path().join("history.json")).await;
    let pool = [
        "Love the colors here — feels like a quiet moment in the middle of the city.",
        "I've walked past this place so many times, it always feels warm.",
        "This lighting is beautiful, evenings here always look like this.",
        "This spot looks so peaceful… adding it to my list.",
        "The textures feel so calm, like a pause from the rush outside.",
        "Feels like a soft pocket of the city, gentle and close.",
        "Something about this looks thoughtful, like the city exhaling.",
        "This looks so fun — makes me want to wander over right now.",
        "Quiet scene, it feels like a good place to settle in for a while.",
        "Light looks tender here, the kind of place that lifts the day.",
        "Love how soft evening light sits in the scene.",
    ];
    for (i, text) in pool.iter().enumerate() {
        history
            .append(EngagementRecord {
                account_id: format!("other-{i}"),
                username: None,
                media_id: format!("other-media-{i}"),
                comment: (*text).to_string(),
                timestamp: Utc::now() - Duration::hours(2),
                mood: "calm".to_string(),
                beat: String::new(),
                status: Outcome::Success,
            })
            .await
            .unwrap();
    }

    let discovery = MockDiscovery::new()
        .with_account("runner", "acct-runner")
        .with_media("acct-runner", post("media-1", 3));

    let comments = Arc::new(MockCommentBackend::succeeding());
    let engine = engine(dir.path(), discovery, Arc::clone(&comments), 24);

    let mut rng = StdRng::seed_from_u64(5);
    let summary = engine.run_cycle_with_rng(&mut rng).await;

    assert_eq!(summary.attempted, 0);
    assert!(summary.skipped_non_unique >= 1);
    assert!(comments.comments().is_empty());
}
