//! Long-running scheduler.
//!
//! A single process drives the whole cadence: the day is planned once (and
//! re-planned at a fixed low-traffic time), due jobs are executed
//! synchronously one at a time, and the loop otherwise sleeps in a coarse
//! once-per-minute poll so it stays responsive to termination signals.
//! Shutdown stops accepting new triggers; an in-flight callback is allowed
//! to finish.

use crate::cadence::{plan_day, PostSignal};
use crate::drafts::DraftStore;
use crate::engagement::EngagementEngine;
use crate::pipeline::{ContentPipeline, CycleOptions};
use crate::scene::SceneStore;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Local time of the daily re-plan.
const REPLAN_HOUR: u32 = 0;
const REPLAN_MINUTE: u32 = 5;

/// Poll interval of the keep-alive loop.
const POLL_SECS: u64 = 60;

/// Recent drafts used as cadence signal.
const SIGNAL_WINDOW: usize = 6;

/// One scheduled callback.
#[derive(Debug, Clone)]
pub struct Job {
    pub at: NaiveDateTime,
    pub kind: JobKind,
}

/// What a job does when it fires.
#[derive(Debug, Clone)]
pub enum JobKind {
    Post { label: String },
    Engagement { label: String },
}

/// The daily scheduler.
pub struct Scheduler {
    pipeline: Arc<ContentPipeline>,
    engagement: Arc<EngagementEngine>,
    drafts: Arc<dyn DraftStore>,
    scene: SceneStore,
    persona_slug: String,
    jobs: Vec<Job>,
    planned_for: Option<NaiveDate>,
}

impl Scheduler {
    pub fn new(
        pipeline: Arc<ContentPipeline>,
        engagement: Arc<EngagementEngine>,
        drafts: Arc<dyn DraftStore>,
        scene: SceneStore,
        persona_slug: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            engagement,
            drafts,
            scene,
            persona_slug: persona_slug.into(),
            jobs: Vec::new(),
            planned_for: None,
        }
    }

    /// Jobs currently queued, soonest first.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Compute today's plan and replace the job queue with it.
    ///
    /// Planning problems are logged, never propagated: the loop must
    /// survive to the next opportunity.
    pub async fn plan_today(&mut self) {
        let now_local = Local::now().naive_local();
        let date = now_local.date();
        info!("planning today's story beats");

        let recent = match self.drafts.recent(SIGNAL_WINDOW).await {
            Ok(drafts) => drafts,
            Err(err) => {
                warn!(%err, "could not read recent drafts for planning");
                Vec::new()
            }
        };
        let signals: Vec<PostSignal> = recent
            .iter()
            .map(|draft| PostSignal {
                likes: 0,
                comments: 0,
                followers: 1,
                created_at: draft.created_at,
            })
            .collect();

        let mut rng = StdRng::from_entropy();
        let snapshot = self.scene.snapshot(date, &mut rng).await;
        let plan = plan_day(&signals, &snapshot, date, Utc::now(), &mut rng);

        let mut jobs: Vec<Job> = Vec::new();
        for event in plan.posts {
            jobs.push(Job {
                at: event.at,
                kind: JobKind::Post { label: event.label },
            });
        }
        for event in plan.engagements {
            jobs.push(Job {
                at: event.at,
                kind: JobKind::Engagement { label: event.label },
            });
        }

        let total = jobs.len();
        jobs.retain(|job| job.at > now_local);
        if jobs.len() < total {
            info!(dropped = total - jobs.len(), "skipped plan entries already in the past");
        }
        jobs.sort_by_key(|job| job.at);

        for job in &jobs {
            match &job.kind {
                JobKind::Post { label } => {
                    info!(label = %label, at = %job.at.format("%H:%M"), "scheduled post");
                }
                JobKind::Engagement { label } => {
                    info!(label = %label, at = %job.at.format("%H:%M"), "scheduled engagement burst");
                }
            }
        }

        self.jobs = jobs;
        self.planned_for = Some(date);
        info!(arc = %snapshot.arc, jobs = self.jobs.len(), "daily plan complete");
    }

    /// Execute every job that has come due, one at a time.
    pub async fn run_due_jobs(&mut self) {
        loop {
            let now = Local::now().naive_local();
            let Some(position) = self.jobs.iter().position(|job| job.at <= now) else {
                break;
            };
            let job = self.jobs.remove(position);
            self.execute(job).await;
        }
    }

    async fn execute(&self, job: Job) {
        match job.kind {
            JobKind::Post { label } => {
                info!(label = %label, "post trigger fired");
                let options = CycleOptions {
                    auto_post: true,
                    headless: true,
                    trigger_engagement: false,
                };
                match self.pipeline.run_cycle(&self.persona_slug, &options).await {
                    Ok(outcome) => {
                        info!(posted = outcome.posted, label = %label, "post cycle finished");
                    }
                    Err(err) => error!(%err, label = %label, "post cycle failed"),
                }
            }
            JobKind::Engagement { label } => {
                info!(label = %label, "engagement window opened");
                let summary = self.engagement.run_cycle().await;
                info!(
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    label = %label,
                    "engagement burst finished"
                );
            }
        }
    }

    fn replan_due(&self, now: NaiveDateTime) -> bool {
        if self.planned_for == Some(now.date()) {
            return false;
        }
        let replan_at = NaiveTime::from_hms_opt(REPLAN_HOUR, REPLAN_MINUTE, 0)
            .unwrap_or(NaiveTime::MIN);
        now.time() >= replan_at
    }

    /// Run until an interrupt arrives.
    pub async fn run(&mut self) {
        self.plan_today().await;
        info!("daily re-planning set for {REPLAN_HOUR:02}:{REPLAN_MINUTE:02}");

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(err) = signal {
                        error!(%err, "signal listener failed, shutting down");
                    } else {
                        info!("scheduler stopped by interrupt");
                    }
                    break;
                }
                _ = tokio::time::sleep(std::time::Duration::from_secs(POLL_SECS)) => {
                    let now = Local::now().naive_local();
                    if self.replan_due(now) {
                        self.plan_today().await;
                    }
                    self.run_due_jobs().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::Disabled;
    use crate::drafts::JsonDraftStore;
    use crate::persona::PersonaStore;
    use crate::pipeline::{PipelinePaths, ContentPipeline};
    use crate::testing::{MockCommentBackend, MockDiscovery};
    use std::sync::Arc;

    fn scheduler(dir: &std::path::Path) -> Scheduler {
        let scene = SceneStore::new(dir.join("scene.json"));
        let drafts: Arc<dyn DraftStore> = Arc::new(JsonDraftStore::new(dir.join("drafts.json")));
        let paths = PipelinePaths {
            variation_state: dir.join("variation.json"),
            generated_dir: dir.join("generated"),
            preview_dir: dir.join("preview"),
        };
        let pipeline = Arc::new(ContentPipeline::new(
            Arc::new(PersonaStore::new(dir.join("personas"))),
            Arc::new(Disabled("text")),
            Arc::new(Disabled("image")),
            Arc::new(Disabled("photos")),
            Arc::new(Disabled("publish")),
            Arc::clone(&drafts),
            scene.clone(),
            paths,
        ));
        let engagement = Arc::new(EngagementEngine::new(
            dir.join("history.json"),
            dir.join("targets.json"),
            scene.clone(),
            Arc::new(MockDiscovery::new()),
            Arc::new(MockCommentBackend::succeeding()),
            24,
            0,
            0,
        ));
        Scheduler::new(pipeline, engagement, drafts, scene, "mina")
    }

    #[tokio::test]
    async fn test_plan_today_queues_future_jobs() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut scheduler = scheduler(dir.path());
        scheduler.plan_today().await;

        let now = Local::now().naive_local();
        for job in scheduler.jobs() {
            assert!(job.at > now);
        }
        assert!(scheduler.planned_for.is_some());
    }

    #[tokio::test]
    async fn test_replan_due_only_once_per_day() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut scheduler = scheduler(dir.path());
        scheduler.plan_today().await;

        let now = Local::now().naive_local();
        assert!(!scheduler.replan_due(now));

        let tomorrow = now.date() + chrono::Duration::days(1);
        let after_replan = tomorrow.and_hms_opt(0, 6, 0).unwrap();
        assert!(scheduler.replan_due(after_replan));
        let before_replan = tomorrow.and_hms_opt(0, 4, 0).unwrap();
        assert!(!scheduler.replan_due(before_replan));
    }
}
