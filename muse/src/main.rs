//! CLI entry point for the persona agent.
//!
//! `boot` prepares the workspace and validates the persona, `publish`
//! pushes a stored draft to the platform, and `run` starts the
//! long-running scheduler.

use backends::{imagen, llm, photos, social};
use clap::{Parser, Subcommand};
use muse_core::collab::live::{
    LiveImageGenerator, LivePhotoSearch, LivePublisher, LiveTextGenerator,
};
use muse_core::collab::{
    CommentBackend, Disabled, ImageGenerator, PhotoSearch, PublishBackend, SocialDiscovery,
    TextGenerator,
};
use muse_core::{
    ensure_structure, Config, ContentPipeline, DraftStore, EngagementEngine, JsonDraftStore,
    PersonaStore, PipelinePaths, Scheduler, SceneStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_PERSONA: &str = "mina";

#[derive(Parser)]
#[command(name = "muse", about = "Autonomous persona agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Persona slug to operate as.
    #[arg(long, default_value = DEFAULT_PERSONA, global = true)]
    persona: String,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the directory structure and validate the persona.
    Boot,
    /// Publish a stored draft (latest unpublished by default).
    Publish {
        /// Specific draft to publish.
        #[arg(long)]
        draft_id: Option<Uuid>,
        /// Run any browser-driven steps headed instead of headless.
        #[arg(long)]
        headed: bool,
    },
    /// Start the long-running scheduler.
    Run,
}

struct Services {
    personas: Arc<PersonaStore>,
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    photos: Arc<dyn PhotoSearch>,
    publisher: Arc<dyn PublishBackend>,
    comments: Arc<dyn CommentBackend>,
    discovery: Arc<dyn SocialDiscovery>,
    drafts: Arc<dyn DraftStore>,
    scene: SceneStore,
}

/// Wire every collaborator from configuration, degrading gracefully when
/// credentials are absent.
fn build_services(config: &Config) -> Services {
    let text: Arc<dyn TextGenerator> = match &config.text_api_key {
        Some(key) => Arc::new(LiveTextGenerator::new(llm::ChatClient::new(key))),
        None => {
            warn!("text API key missing; ideas and captions will use fallbacks");
            Arc::new(Disabled("text"))
        }
    };

    let image: Arc<dyn ImageGenerator> = match &config.image_api_key {
        Some(key) => Arc::new(LiveImageGenerator::new(imagen::ImageClient::new(key))),
        None => {
            warn!("image API key missing; cycles will produce no media");
            Arc::new(Disabled("image"))
        }
    };

    let photo_search: Arc<dyn PhotoSearch> = match &config.photo_api_key {
        Some(key) => Arc::new(LivePhotoSearch::new(
            photos::PhotoClient::new(key),
            config.references_dir(),
        )),
        None => Arc::new(Disabled("photos")),
    };

    let (publisher, comments, discovery): (
        Arc<dyn PublishBackend>,
        Arc<dyn CommentBackend>,
        Arc<dyn SocialDiscovery>,
    ) = match config.social_credentials() {
        Ok((token, account)) => {
            let live = Arc::new(LivePublisher::new(social::GraphClient::new(token, account)));
            (live.clone(), live.clone(), live)
        }
        Err(_) => {
            warn!("social credentials missing; publishing and engagement disabled");
            (
                Arc::new(Disabled("publish")),
                Arc::new(Disabled("comments")),
                Arc::new(Disabled("discovery")),
            )
        }
    };

    Services {
        personas: Arc::new(PersonaStore::new(config.persona_dir.clone())),
        text,
        image,
        photos: photo_search,
        publisher,
        comments,
        discovery,
        drafts: Arc::new(JsonDraftStore::new(config.drafts_path())),
        scene: SceneStore::new(config.scene_memory_path()),
    }
}

fn build_engagement(config: &Config, services: &Services) -> Arc<EngagementEngine> {
    Arc::new(EngagementEngine::new(
        config.engagement_history_path(),
        config.targets_path(),
        services.scene.clone(),
        Arc::clone(&services.discovery),
        Arc::clone(&services.comments),
        config.engagement_cooldown_hours,
        config.engagement_min_delay_secs,
        config.engagement_max_delay_secs,
    ))
}

fn build_pipeline(
    config: &Config,
    services: &Services,
    engagement: Arc<EngagementEngine>,
) -> Arc<ContentPipeline> {
    Arc::new(
        ContentPipeline::new(
            Arc::clone(&services.personas),
            Arc::clone(&services.text),
            Arc::clone(&services.image),
            Arc::clone(&services.photos),
            Arc::clone(&services.publisher),
            Arc::clone(&services.drafts),
            services.scene.clone(),
            PipelinePaths::from_config(config),
        )
        .with_engagement(engagement),
    )
}

async fn boot(config: &Config, services: &Services, persona: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("booting persona agent");
    ensure_structure(config).await?;
    let persona = services.personas.get(persona).await?;
    info!(
        persona = %persona.display_name,
        id = %persona.id,
        "persona loaded, system ready"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let services = build_services(&config);
    let engagement = build_engagement(&config, &services);
    let pipeline = build_pipeline(&config, &services, Arc::clone(&engagement));

    match cli.command.unwrap_or(Command::Boot) {
        Command::Boot => {
            if let Err(err) = boot(&config, &services, &cli.persona).await {
                error!(%err, "boot failed");
                std::process::exit(1);
            }
        }
        Command::Publish { draft_id, headed } => {
            match pipeline.publish_draft(draft_id, !headed).await {
                Ok(receipt) => info!(status = ?receipt.status, detail = %receipt.detail, "publish finished"),
                Err(err) => {
                    error!(%err, "publish failed");
                    std::process::exit(1);
                }
            }
        }
        Command::Run => {
            let mut scheduler = Scheduler::new(
                pipeline,
                engagement,
                Arc::clone(&services.drafts),
                services.scene.clone(),
                cli.persona.clone(),
            );
            scheduler.run().await;
        }
    }
}
