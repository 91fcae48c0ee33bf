//! `collect` command: one pipeline run, recorded in `collection_runs` unless
//! it is a dry run.

use std::sync::Arc;

use chrono::NaiveDate;
use trendshorts_core::{format_compact_count, AppConfig, Candidate};
use trendshorts_pipeline::{
    run_recorded, CollectionRunResult, MemoryTrendingStore, MokaMetadataCache, PgTrendingStore,
    PipelineOrchestrator, RunOutcome, RunRequest, TrendingStore, TriggerSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CollectArgs {
    pub limit: Option<usize>,
    pub enhance: bool,
    pub parallel: bool,
    pub workers: Option<usize>,
    pub date: Option<NaiveDate>,
}

/// Resolves command-line overrides against configured defaults.
pub(crate) fn build_request(config: &AppConfig, args: CollectArgs) -> RunRequest {
    RunRequest {
        parallel: Some(args.parallel),
        worker_count: Some(args.workers.unwrap_or(config.enrich_workers).max(1)),
        bucket_date: args.date,
        ..RunRequest::new(
            args.limit.unwrap_or(config.collect_max_candidates),
            args.enhance,
        )
    }
}

fn build_orchestrator(
    config: &AppConfig,
    store: Arc<dyn TrendingStore>,
) -> anyhow::Result<PipelineOrchestrator> {
    let cache = Arc::new(MokaMetadataCache::new(config.metadata_cache_capacity));
    PipelineOrchestrator::live(config, store, cache)
        .map_err(|e| anyhow::anyhow!("failed to build page client: {e}"))
}

/// Runs the pipeline and records it as a `cli` collection run.
///
/// # Errors
///
/// Returns an error if the run cannot be recorded or ends fatally.
pub(crate) async fn run_collect(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: CollectArgs,
) -> anyhow::Result<()> {
    let store = Arc::new(PgTrendingStore::new(pool.clone()));
    let orchestrator = build_orchestrator(config, store)?;

    let recorded = run_recorded(
        pool,
        &orchestrator,
        TriggerSource::Cli,
        build_request(config, args),
    )
    .await?;

    println!("collection run {}", recorded.run_id);
    print_summary(&recorded.result);
    if let Some(fatal) = &recorded.result.fatal_error {
        anyhow::bail!("collection run {} failed: {fatal}", recorded.run_id);
    }
    Ok(())
}

/// Runs the full pipeline against an in-memory store and prints what would
/// have been written.
///
/// # Errors
///
/// Returns an error if the page client cannot be built or the run ends fatally.
pub(crate) async fn run_collect_dry(config: &AppConfig, args: CollectArgs) -> anyhow::Result<()> {
    let store = Arc::new(MemoryTrendingStore::new());
    let orchestrator = build_orchestrator(config, store)?;

    let request = build_request(config, args);
    tracing::info!(?request, "dry-run collection against in-memory store");
    let result = orchestrator.run_with(request).await;

    println!("dry-run: nothing written to the database");
    print_summary(&result);
    if let Some(fatal) = &result.fatal_error {
        anyhow::bail!("dry-run failed: {fatal}");
    }

    println!();
    println!("{:<6}{:<14}{:>9}  {:<40}  URL", "RANK", "VIDEO", "VIEWS", "TITLE");
    for candidate in &result.ranked {
        println!("{}", ranked_line(candidate));
    }
    Ok(())
}

pub(crate) fn ranked_line(candidate: &Candidate) -> String {
    format!(
        "{:<6}{:<14}{:>9}  {:<40}  {}",
        candidate.rank.unwrap_or_default(),
        candidate.external_id(),
        format_compact_count(candidate.view_count),
        truncate_title(&candidate.title, 40),
        candidate.watch_url()
    )
}

fn print_summary(result: &CollectionRunResult) {
    let outcome = match result.outcome() {
        RunOutcome::Succeeded => "succeeded",
        RunOutcome::Degraded => "completed with errors",
        RunOutcome::Failed => "failed",
    };
    println!(
        "{} {outcome}: extracted {}, enriched {}, validated {}, excluded {}, created {} ({} short-form), skipped {}, failed {}",
        result.bucket_date,
        result.extracted,
        result.enriched,
        result.validated,
        result.excluded,
        result.created,
        result.created_short_form,
        result.skipped,
        result.failed
    );
    for error in &result.errors {
        eprintln!("warning: {error}");
    }
}

pub(crate) fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        format!("{}...", title.chars().take(max_chars).collect::<String>())
    } else {
        title.to_owned()
    }
}
