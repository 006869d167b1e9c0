//! End-to-end content cycle tests with scripted collaborators.

use muse_core::arcs::is_banned_location;
use muse_core::collab::PublishStatus;
use muse_core::error::PipelineError;
use muse_core::pipeline::PipelinePaths;
use muse_core::testing::{
    MockImageGenerator, MockPhotoSearch, MockPublisher, MockTextGenerator,
};
use muse_core::{
    ContentPipeline, CycleOptions, DraftStore, JsonDraftStore, PersonaStore, SceneStore,
};
use std::path::Path;
use std::sync::Arc;

const IDEA_RESPONSE: &str = r#"{"idea": "warm window seat before rain", "location": {"name": "Seongsu warehouse café", "description": "corner table by the glass", "keywords": ["cafe", "window", "rain"], "shot_category": "selfie_morning"}}"#;

fn write_persona(root: &Path) {
    let dir = root.join("personas").join("mina");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("persona.json"),
        r#"{
            "id": "mina",
            "display_name": "Mina",
            "home_city": "Seoul",
            "appearance": {
                "summary": "young woman with shoulder-length dark hair",
                "hair": "shoulder-length, dark brown",
                "eyes": "dark brown",
                "aesthetic_keywords": ["muted tones", "film grain"]
            }
        }"#,
    )
    .unwrap();
}

struct Harness {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
    drafts: Arc<JsonDraftStore>,
    publisher: Arc<MockPublisher>,
}

fn build_pipeline(
    text: MockTextGenerator,
    image: MockImageGenerator,
    publish_status: PublishStatus,
) -> (Harness, ContentPipeline) {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    write_persona(&root);

    let drafts = Arc::new(JsonDraftStore::new(root.join("drafts.json")));
    let publisher = Arc::new(MockPublisher::with_status(publish_status));
    let paths = PipelinePaths {
        variation_state: root.join("variation.json"),
        generated_dir: root.join("generated"),
        preview_dir: root.join("preview"),
    };

    let pipeline = ContentPipeline::new(
        Arc::new(PersonaStore::new(root.join("personas"))),
        Arc::new(text),
        Arc::new(image),
        Arc::new(MockPhotoSearch::empty()),
        Arc::clone(&publisher) as Arc<dyn muse_core::collab::PublishBackend>,
        Arc::clone(&drafts) as Arc<dyn DraftStore>,
        SceneStore::new(root.join("scene.json")),
        paths,
    );

    (
        Harness {
            _dir: dir,
            root,
            drafts,
            publisher,
        },
        pipeline,
    )
}

#[tokio::test]
async fn preview_cycle_stores_draft_and_preview() {
    let text = MockTextGenerator::with_responses(vec![
        Ok(IDEA_RESPONSE.to_string()),
        Ok("Window seat again, rain soon ☕ #CafeRun #CityDiaries".to_string()),
    ]);
    let image = MockImageGenerator::returning(vec![1, 2, 3, 4]);
    let (harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let outcome = pipeline
        .run_cycle("mina", &CycleOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.idea.as_deref(), Some("warm window seat before rain"));
    assert_eq!(
        outcome.location.as_ref().map(|l| l.name.as_str()),
        Some("Seongsu warehouse café")
    );
    assert!(outcome.caption.as_deref().unwrap().contains("#CafeRun"));
    assert!(!outcome.posted);

    // Media landed on disk.
    let media = outcome.media_path.expect("media generated");
    assert_eq!(std::fs::read(&media).unwrap(), vec![1, 2, 3, 4]);

    // Draft stored, unpublished.
    let draft = harness.drafts.get(outcome.draft_id.unwrap()).await.unwrap();
    assert!(!draft.published);
    assert_eq!(draft.idea, "warm window seat before rain");

    // Preview file written, no publish attempted.
    let previews: Vec<_> = std::fs::read_dir(harness.root.join("preview"))
        .unwrap()
        .collect();
    assert_eq!(previews.len(), 1);
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn auto_post_cycle_publishes_and_flags_draft() {
    let text = MockTextGenerator::with_responses(vec![
        Ok(IDEA_RESPONSE.to_string()),
        Ok("Posting this one 💛 #CityDiaries".to_string()),
    ]);
    let image = MockImageGenerator::returning(vec![9; 16]);
    let (harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let options = CycleOptions {
        auto_post: true,
        ..CycleOptions::default()
    };
    let outcome = pipeline.run_cycle("mina", &options).await.unwrap();

    assert!(outcome.posted);
    assert!(outcome.stage_errors.is_empty());

    let published = harness.publisher.published();
    assert_eq!(published.len(), 1);
    assert!(published[0].1.contains("#CityDiaries"));

    let draft = harness.drafts.get(outcome.draft_id.unwrap()).await.unwrap();
    assert!(draft.published);
}

#[tokio::test]
async fn pending_publish_leaves_draft_unpublished() {
    let text = MockTextGenerator::with_responses(vec![
        Ok(IDEA_RESPONSE.to_string()),
        Ok("caption".to_string()),
    ]);
    let image = MockImageGenerator::returning(vec![7; 8]);
    let (harness, pipeline) = build_pipeline(text, image, PublishStatus::Pending);

    let options = CycleOptions {
        auto_post: true,
        ..CycleOptions::default()
    };
    let outcome = pipeline.run_cycle("mina", &options).await.unwrap();

    // Pending is a retry candidate, not a success.
    assert!(!outcome.posted);
    assert!(outcome.stage_errors.iter().any(|e| e.contains("Pending")));
    let draft = harness.drafts.get(outcome.draft_id.unwrap()).await.unwrap();
    assert!(!draft.published);
}

#[tokio::test]
async fn image_failure_degrades_but_cycle_completes() {
    let text = MockTextGenerator::with_responses(vec![
        Ok(IDEA_RESPONSE.to_string()),
        Ok("still captioned".to_string()),
    ]);
    let image = MockImageGenerator::failing();
    let (harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let options = CycleOptions {
        auto_post: true,
        ..CycleOptions::default()
    };
    let outcome = pipeline.run_cycle("mina", &options).await.unwrap();

    assert!(outcome.media_path.is_none());
    assert!(!outcome.posted);
    assert!(outcome
        .stage_errors
        .iter()
        .any(|e| e.contains("image generation")));

    // The draft survives for a later retry, without media.
    let draft = harness.drafts.get(outcome.draft_id.unwrap()).await.unwrap();
    assert!(draft.media_path.is_none());
    assert!(!draft.published);
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn text_failure_falls_back_everywhere() {
    let text = MockTextGenerator::always_failing();
    let image = MockImageGenerator::returning(vec![1]);
    let (_harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let outcome = pipeline
        .run_cycle("mina", &CycleOptions::default())
        .await
        .unwrap();

    // Deterministic fallbacks: arc-derived idea, template caption.
    let idea = outcome.idea.unwrap();
    assert!(idea.contains(" near "));
    let caption = outcome.caption.unwrap();
    assert!(caption.contains('#'));
    assert!(outcome.location.is_some());
}

#[tokio::test]
async fn missing_persona_is_the_only_error() {
    let text = MockTextGenerator::always_failing();
    let image = MockImageGenerator::failing();
    let (_harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let err = pipeline
        .run_cycle("nobody", &CycleOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[tokio::test]
async fn banned_locations_never_survive_randomized_trials() {
    let (_harness, pipeline) = {
        let mut responses = Vec::new();
        for _ in 0..1000 {
            responses.push(Ok(
                r#"{"idea": "palace gates at dusk", "location": {"name": "Gyeongbokgung", "description": "crowded", "keywords": ["palace"]}}"#.to_string(),
            ));
            responses.push(Ok("caption".to_string()));
        }
        build_pipeline(
            MockTextGenerator::with_responses(responses),
            MockImageGenerator::returning(vec![1]),
            PublishStatus::Success,
        )
    };

    for _ in 0..1000 {
        let outcome = pipeline
            .run_cycle("mina", &CycleOptions::default())
            .await
            .unwrap();
        let location = outcome.location.unwrap();
        assert!(!is_banned_location(&location.name));
    }
}

#[tokio::test]
async fn publish_draft_by_id_and_latest() {
    let text = MockTextGenerator::with_responses(vec![
        Ok(IDEA_RESPONSE.to_string()),
        Ok("caption one".to_string()),
    ]);
    let image = MockImageGenerator::returning(vec![3; 4]);
    let (harness, pipeline) = build_pipeline(text, image, PublishStatus::Success);

    let outcome = pipeline
        .run_cycle("mina", &CycleOptions::default())
        .await
        .unwrap();
    let draft_id = outcome.draft_id.unwrap();

    // Publish the latest unpublished draft without naming it.
    let receipt = pipeline.publish_draft(None, true).await.unwrap();
    assert_eq!(receipt.status, PublishStatus::Success);
    assert!(harness.drafts.get(draft_id).await.unwrap().published);

    // Nothing left to publish.
    assert!(pipeline.publish_draft(None, true).await.is_err());
}
