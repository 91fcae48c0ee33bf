//! Process-wide collection trigger shared by the API and the scheduler.
//!
//! At most one server-triggered run is in flight at a time. All runs share
//! one metadata cache so repeated triggers within the TTL skip the provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use trendshorts_core::AppConfig;
use trendshorts_db::{CollectionRunRow, DbError};
use trendshorts_pipeline::{
    begin_run, execute_run, MetadataCache, MokaMetadataCache, PgTrendingStore,
    PipelineOrchestrator, RecordedRun, RunRequest, TrendingStore, TriggerSource,
};
use trendshorts_scraper::ScraperError;

/// Builds a fresh orchestrator per run around the shared store and cache.
pub type OrchestratorFactory = Arc<
    dyn Fn(
            Arc<dyn TrendingStore>,
            Arc<dyn MetadataCache>,
        ) -> Result<PipelineOrchestrator, ScraperError>
        + Send
        + Sync,
>;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("a collection run is already in progress")]
    InFlight,
    #[error("failed to build pipeline: {0}")]
    Pipeline(#[from] ScraperError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Collector {
    pool: PgPool,
    config: Arc<AppConfig>,
    cache: Arc<MokaMetadataCache>,
    in_flight: Arc<AtomicBool>,
    build: OrchestratorFactory,
}

impl Collector {
    pub fn new(pool: PgPool, config: Arc<AppConfig>, build: OrchestratorFactory) -> Self {
        let cache = Arc::new(MokaMetadataCache::new(config.metadata_cache_capacity));
        Self {
            pool,
            config,
            cache,
            in_flight: Arc::new(AtomicBool::new(false)),
            build,
        }
    }

    /// Wires the reqwest page client and `yt-dlp` provider.
    pub fn live(pool: PgPool, config: Arc<AppConfig>) -> Self {
        let wiring_config = Arc::clone(&config);
        let build: OrchestratorFactory = Arc::new(
            move |store: Arc<dyn TrendingStore>, cache: Arc<dyn MetadataCache>| {
                PipelineOrchestrator::live(&wiring_config, store, cache)
            },
        );
        Self::new(pool, config, build)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Live entries in the shared metadata cache.
    pub fn cached_metadata(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Request with configured defaults and today's bucket.
    pub fn default_request(&self) -> RunRequest {
        RunRequest::new(self.config.collect_max_candidates, true)
    }

    fn try_acquire(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(&self.in_flight)))
    }

    fn orchestrator(&self) -> Result<PipelineOrchestrator, ScraperError> {
        let store: Arc<dyn TrendingStore> = Arc::new(PgTrendingStore::new(self.pool.clone()));
        let cache: Arc<dyn MetadataCache> = self.cache.clone();
        (self.build)(store, cache)
    }

    /// Creates a queued run and executes it in the background.
    ///
    /// Returns as soon as the run row exists.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::InFlight`] while another run holds the guard.
    /// - [`TriggerError::Pipeline`] / [`TriggerError::Db`] if the run cannot be set up.
    pub async fn spawn(
        &self,
        trigger: TriggerSource,
        request: RunRequest,
    ) -> Result<CollectionRunRow, TriggerError> {
        let guard = self.try_acquire().ok_or(TriggerError::InFlight)?;
        let orchestrator = self.orchestrator()?;
        let run = begin_run(&self.pool, trigger, request.bucket_date).await?;

        let pool = self.pool.clone();
        let queued = run.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match execute_run(&pool, &orchestrator, &queued, request).await {
                Ok(recorded) => log_recorded(&recorded),
                Err(e) => {
                    tracing::error!(run_id = queued.id, error = %e, "collection run could not start");
                }
            }
        });

        Ok(run)
    }

    /// Runs to completion on the caller's task.
    ///
    /// # Errors
    ///
    /// Same as [`Collector::spawn`].
    pub async fn run(
        &self,
        trigger: TriggerSource,
        request: RunRequest,
    ) -> Result<RecordedRun, TriggerError> {
        let _guard = self.try_acquire().ok_or(TriggerError::InFlight)?;
        let orchestrator = self.orchestrator()?;
        let run = begin_run(&self.pool, trigger, request.bucket_date).await?;
        let recorded = execute_run(&self.pool, &orchestrator, &run, request).await?;
        log_recorded(&recorded);
        Ok(recorded)
    }
}

fn log_recorded(recorded: &RecordedRun) {
    let result = &recorded.result;
    tracing::info!(
        run_id = recorded.run_id,
        bucket_date = %result.bucket_date,
        outcome = ?result.outcome(),
        created = result.created,
        skipped = result.skipped,
        failed = result.failed,
        "collection run recorded"
    );
}
