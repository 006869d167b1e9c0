//! Narrative-state scheduling and variation engine for an autonomous
//! social persona.
//!
//! This crate provides:
//! - A persistent weekly story-arc state machine driving theme, location,
//!   and mood selection
//! - Deterministic, confidence-gated cycling through pose/outfit/
//!   environment/camera variation
//! - An adaptive daily cadence planner for posts and engagement bursts
//! - A content pipeline with per-stage retry/fallback across unreliable
//!   external generators
//! - A throttled engagement loop with cooldown and dedup enforcement
//!
//! External services (text generation, image generation, photo search,
//! publishing) sit behind the traits in [`collab`]; `testing` ships
//! scripted mocks for all of them.
//!
//! # Quick Start
//!
//! ```ignore
//! use muse_core::{ContentPipeline, CycleOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline: ContentPipeline = build_pipeline()?; // wire collaborators, see the `muse` binary
//!     let outcome = pipeline.run_cycle("mina", &CycleOptions::default()).await?;
//!     println!("posted: {}", outcome.posted);
//!     Ok(())
//! }
//! ```

pub mod arcs;
pub mod cadence;
pub mod caption;
pub mod collab;
pub mod config;
pub mod drafts;
pub mod engagement;
pub mod error;
pub mod idea;
pub mod persona;
pub mod pipeline;
pub mod scene;
pub mod scheduler;
pub mod selection;
pub mod testing;
pub mod variation;

// Primary public API
pub use config::{ensure_structure, Config};
pub use drafts::{DraftStore, JsonDraftStore, PostDraft};
pub use engagement::EngagementEngine;
pub use error::{CollabError, ConfigError, PipelineError, PublishError};
pub use persona::{Persona, PersonaStore};
pub use pipeline::{ContentPipeline, CycleOptions, CycleOutcome, PipelinePaths};
pub use scene::SceneStore;
pub use scheduler::Scheduler;
pub use variation::VariationState;
