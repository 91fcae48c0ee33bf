//! Background job scheduler.
//!
//! Registers the daily collection and retention jobs at server startup.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendshorts_core::AppConfig;
use trendshorts_pipeline::{apply_retention, retention_cutoff, TriggerSource};

use crate::collector::{Collector, TriggerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    collector: Arc<Collector>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_collect_job(&scheduler, &config.collect_cron, collector).await?;
    register_retention_job(&scheduler, pool, &config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_collect_job(
    scheduler: &JobScheduler,
    cron: &str,
    collector: Arc<Collector>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let collector = Arc::clone(&collector);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily collection");
            run_collect_job(&collector).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: collection job registered");
    Ok(())
}

async fn run_collect_job(collector: &Collector) {
    match collector
        .run(TriggerSource::Scheduler, collector.default_request())
        .await
    {
        Ok(recorded) => {
            if let Some(fatal) = &recorded.result.fatal_error {
                tracing::error!(run_id = recorded.run_id, error = %fatal, "scheduler: collection failed");
            }
        }
        Err(TriggerError::InFlight) => {
            tracing::warn!("scheduler: collection skipped, another run is in progress");
        }
        Err(e) => tracing::error!(error = %e, "scheduler: collection could not start"),
    }
}

async fn register_retention_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: &AppConfig,
) -> Result<(), JobSchedulerError> {
    let retention_days = config.retention_days;
    let pool = Arc::new(pool);

    let job = Job::new_async(config.retention_cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            let cutoff = retention_cutoff(Utc::now().date_naive(), retention_days);
            match apply_retention(&pool, cutoff, false, false).await {
                Ok(report) => tracing::info!(
                    %cutoff,
                    videos = report.videos,
                    stats = report.stats,
                    "scheduler: retention cleanup complete"
                ),
                Err(e) => tracing::error!(%cutoff, error = %e, "scheduler: retention cleanup failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %config.retention_cron, retention_days, "scheduler: retention job registered");
    Ok(())
}
