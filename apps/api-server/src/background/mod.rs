//! Background jobs: the scheduled-post publisher.

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use marquee_core::service::PostService;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable the background publisher.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Cron job scheduler wrapper. Dropping it stops the jobs.
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    async fn new() -> Result<Self, JobSchedulerError> {
        Ok(Self {
            inner: JobScheduler::new().await?,
        })
    }

    async fn add_cron<F, Fut>(&self, schedule: &str, task: F) -> Result<(), JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(())
    }
}

/// Start the scheduled-post publisher: once a minute, every scheduled post
/// whose slot has passed goes live.
pub async fn start(
    config: &SchedulerConfig,
    posts: PostService,
) -> Result<Option<Scheduler>, JobSchedulerError> {
    if !config.enabled {
        tracing::info!("Scheduler disabled");
        return Ok(None);
    }

    let scheduler = Scheduler::new().await?;

    scheduler
        .add_cron("0 * * * * *", move || {
            let posts = posts.clone();
            async move {
                match posts.publish_due(Utc::now()).await {
                    Ok(ids) if !ids.is_empty() => {
                        tracing::info!(count = ids.len(), "Published scheduled posts");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Scheduled publish sweep failed");
                    }
                }
            }
        })
        .await?;

    scheduler.inner.start().await?;
    tracing::info!("Scheduler started");

    Ok(Some(scheduler))
}
