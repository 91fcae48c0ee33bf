//! Runs the pipeline inside a `collection_runs` row and folds the outcome
//! into `trending_stats`.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use trendshorts_db::{CollectionRunRow, DbError, RunCounts};

use crate::orchestrator::{CollectionRunResult, PipelineOrchestrator, RunRequest};

/// Who asked for the run; stored on the `collection_runs` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Cli,
    Api,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Cli => "cli",
            TriggerSource::Api => "api",
            TriggerSource::Scheduler => "scheduler",
        }
    }
}

#[derive(Debug)]
pub struct RecordedRun {
    pub run_id: i64,
    pub result: CollectionRunResult,
}

/// Creates the `queued` run row for `bucket_date` (today when `None`).
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn begin_run(
    pool: &PgPool,
    trigger: TriggerSource,
    bucket_date: Option<NaiveDate>,
) -> Result<CollectionRunRow, DbError> {
    let bucket_date = bucket_date.unwrap_or_else(|| Utc::now().date_naive());
    trendshorts_db::create_collection_run(pool, trigger.as_str(), bucket_date).await
}

/// Starts a queued run, executes the pipeline and records the outcome.
///
/// Bookkeeping after the pipeline has run never masks its result: failures
/// to mark the run or update stats are logged and the result is returned.
///
/// # Errors
///
/// Returns [`DbError`] only if the run cannot be moved to `running`.
pub async fn execute_run(
    pool: &PgPool,
    orchestrator: &PipelineOrchestrator,
    run: &CollectionRunRow,
    mut request: RunRequest,
) -> Result<RecordedRun, DbError> {
    if let Err(e) = trendshorts_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e);
    }

    request.bucket_date = Some(run.bucket_date);
    request.collection_run_id = Some(run.id);
    let result = orchestrator.run_with(request).await;

    if let Some(fatal) = &result.fatal_error {
        fail_run_best_effort(pool, run.id, fatal.to_string()).await;
    } else if let Err(e) =
        trendshorts_db::complete_collection_run(pool, run.id, run_counts(&result)).await
    {
        tracing::error!(run_id = run.id, error = %e, "failed to mark collection run as succeeded");
    }

    if let Err(e) = trendshorts_db::record_collection_outcome(
        pool,
        result.bucket_date,
        saturating_i32(result.created),
        saturating_i32(result.created_short_form),
        result.fatal_error.is_none(),
    )
    .await
    {
        tracing::warn!(run_id = run.id, error = %e, "failed to update trending stats");
    }

    Ok(RecordedRun {
        run_id: run.id,
        result,
    })
}

/// [`begin_run`] followed by [`execute_run`].
///
/// # Errors
///
/// Returns [`DbError`] if the run row cannot be created or started.
pub async fn run_recorded(
    pool: &PgPool,
    orchestrator: &PipelineOrchestrator,
    trigger: TriggerSource,
    request: RunRequest,
) -> Result<RecordedRun, DbError> {
    let run = begin_run(pool, trigger, request.bucket_date).await?;
    execute_run(pool, orchestrator, &run, request).await
}

/// Marks `run_id` as failed, logging rather than propagating a bookkeeping error.
pub async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = trendshorts_db::fail_collection_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark collection run as failed"
        );
    }
}

#[must_use]
pub fn run_counts(result: &CollectionRunResult) -> RunCounts {
    RunCounts {
        extracted: saturating_i32(result.extracted),
        enriched: saturating_i32(result.enriched),
        validated: saturating_i32(result.validated),
        excluded: saturating_i32(result.excluded),
        created: saturating_i32(result.created),
        skipped: saturating_i32(result.skipped),
        failed: saturating_i32(result.failed),
    }
}

fn saturating_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sources_match_schema_values() {
        assert_eq!(TriggerSource::Cli.as_str(), "cli");
        assert_eq!(TriggerSource::Api.as_str(), "api");
        assert_eq!(TriggerSource::Scheduler.as_str(), "scheduler");
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        assert_eq!(saturating_i32(7), 7);
        assert_eq!(saturating_i32(usize::MAX), i32::MAX);
    }
}
