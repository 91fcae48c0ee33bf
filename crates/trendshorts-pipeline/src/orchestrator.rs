//! Pipeline orchestration: render → extract → enrich → validate → rank → persist.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use trendshorts_core::{AppConfig, Candidate};
use trendshorts_scraper::{
    extract_initial_data, CandidateExtractor, MetadataProvider, PageRenderer, ScraperError,
    TrendingPageClient, YtDlpProvider,
};

use crate::accumulate::AccumulationStore;
use crate::cache::MetadataCache;
use crate::enrich::{EnrichOptions, MetadataEnricher, ProviderFactory};
use crate::rank::{assign_ranks, sort_by_views};
use crate::store::TrendingStore;
use crate::validate::validate;

/// Failures that end a run before any candidate exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page render failed: {0}")]
    Render(#[source] ScraperError),
    #[error("candidate extraction failed: {0}")]
    Extraction(#[source] ScraperError),
}

/// Linear run state. `Failed` is only reachable before candidates exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Start,
    Extracted,
    Enriched,
    Validated,
    Ranked,
    Persisted,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Degraded,
    Failed,
}

#[derive(Debug)]
pub struct CollectionRunResult {
    pub bucket_date: NaiveDate,
    pub stage: RunStage,
    pub extracted: usize,
    pub enriched: usize,
    pub validated: usize,
    pub excluded: usize,
    pub created: usize,
    pub created_short_form: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Non-fatal stage errors, one line per degraded item.
    pub errors: Vec<String>,
    pub fatal_error: Option<PipelineError>,
    /// Ranked candidates handed to the store, rank 1 first.
    pub ranked: Vec<Candidate>,
}

impl CollectionRunResult {
    fn empty(bucket_date: NaiveDate) -> Self {
        Self {
            bucket_date,
            stage: RunStage::Start,
            extracted: 0,
            enriched: 0,
            validated: 0,
            excluded: 0,
            created: 0,
            created_short_form: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
            fatal_error: None,
            ranked: Vec::new(),
        }
    }

    fn fatal(bucket_date: NaiveDate, error: PipelineError) -> Self {
        tracing::error!(%bucket_date, error = %error, "collection run failed");
        Self {
            stage: RunStage::Failed,
            fatal_error: Some(error),
            ..Self::empty(bucket_date)
        }
    }

    /// `Degraded` when any item was dropped or lost its enrichment.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        if self.fatal_error.is_some() {
            RunOutcome::Failed
        } else if self.errors.is_empty() && self.failed == 0 && self.excluded == 0 {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Degraded
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub trending_url: String,
    pub max_depth: usize,
    pub default_max_candidates: usize,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            trending_url: config.trending_url.clone(),
            max_depth: config.extract_max_depth,
            default_max_candidates: config.collect_max_candidates,
        }
    }
}

/// Parameters of a single run. `None` fields fall back to the configured
/// enrichment options and today's UTC date.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest {
    pub max_candidates: usize,
    pub enhance: bool,
    pub parallel: Option<bool>,
    pub worker_count: Option<usize>,
    pub bucket_date: Option<NaiveDate>,
    pub collection_run_id: Option<i64>,
}

impl RunRequest {
    #[must_use]
    pub fn new(max_candidates: usize, enhance: bool) -> Self {
        Self {
            max_candidates,
            enhance,
            parallel: None,
            worker_count: None,
            bucket_date: None,
            collection_run_id: None,
        }
    }
}

pub struct PipelineOrchestrator {
    renderer: Arc<dyn PageRenderer>,
    enricher: MetadataEnricher,
    accumulator: AccumulationStore,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        enricher: MetadataEnricher,
        accumulator: AccumulationStore,
        options: PipelineOptions,
    ) -> Self {
        Self {
            renderer,
            enricher,
            accumulator,
            options,
        }
    }

    /// Wires an orchestrator from configuration plus its collaborators.
    #[must_use]
    pub fn from_app_config(
        config: &AppConfig,
        renderer: Arc<dyn PageRenderer>,
        store: Arc<dyn TrendingStore>,
        cache: Arc<dyn MetadataCache>,
        providers: ProviderFactory,
    ) -> Self {
        let enrich_options = EnrichOptions {
            parallel: config.enrich_parallel,
            worker_count: config.enrich_workers,
            sequential_delay: Duration::from_millis(config.enrich_sequential_delay_ms),
            cache_ttl: Duration::from_secs(config.metadata_cache_ttl_secs),
        };
        Self::new(
            renderer,
            MetadataEnricher::new(cache, providers, enrich_options),
            AccumulationStore::new(store, config.region_code.clone()),
            PipelineOptions::from_app_config(config),
        )
    }

    /// Production wiring: reqwest page client plus one `yt-dlp` provider per worker.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the page client cannot be built.
    pub fn live(
        config: &AppConfig,
        store: Arc<dyn TrendingStore>,
        cache: Arc<dyn MetadataCache>,
    ) -> Result<Self, ScraperError> {
        let renderer = Arc::new(TrendingPageClient::from_app_config(config)?);
        let ytdlp = YtDlpProvider::from_app_config(config);
        let providers: ProviderFactory =
            Arc::new(move || Box::new(ytdlp.clone()) as Box<dyn MetadataProvider>);
        Ok(Self::from_app_config(config, renderer, store, cache, providers))
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TrendingStore> {
        self.accumulator.store()
    }

    pub async fn run(&self, max_candidates: usize, enhance: bool) -> CollectionRunResult {
        self.run_with(RunRequest::new(max_candidates, enhance)).await
    }

    /// Runs the pipeline once. Only render and extraction failures end the
    /// run early; every later problem is counted and the run still finishes.
    pub async fn run_with(&self, request: RunRequest) -> CollectionRunResult {
        let collected_at = Utc::now();
        let bucket_date = request
            .bucket_date
            .unwrap_or_else(|| collected_at.date_naive());
        let url = &self.options.trending_url;

        tracing::info!(
            %bucket_date,
            max_candidates = request.max_candidates,
            enhance = request.enhance,
            "collection run starting"
        );

        let payload = match self.renderer.render(url).await {
            Ok(payload) => payload,
            Err(e) => return CollectionRunResult::fatal(bucket_date, PipelineError::Render(e)),
        };
        let mut candidates = match extract_initial_data(&payload, url).and_then(|root| {
            CandidateExtractor::new(self.options.max_depth, collected_at).extract(&root)
        }) {
            Ok(candidates) => candidates,
            Err(e) => {
                return CollectionRunResult::fatal(bucket_date, PipelineError::Extraction(e))
            }
        };

        let mut result = CollectionRunResult::empty(bucket_date);
        if candidates.len() > request.max_candidates {
            tracing::info!(
                found = candidates.len(),
                kept = request.max_candidates,
                "truncating candidates"
            );
            candidates.truncate(request.max_candidates);
        }
        result.extracted = candidates.len();
        result.stage = RunStage::Extracted;
        if candidates.is_empty() {
            tracing::warn!(%bucket_date, "page contained no short-form entries");
            result
                .errors
                .push("no short-form entries found on page".to_owned());
        }

        if request.enhance && !candidates.is_empty() {
            let defaults = self.enricher.options();
            let report = self
                .enricher
                .enrich(
                    candidates,
                    request.parallel.unwrap_or(defaults.parallel),
                    request.worker_count.unwrap_or(defaults.worker_count),
                )
                .await;
            result.enriched = report.enriched;
            result.errors.extend(
                report
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.video_id, f.error)),
            );
            candidates = report.candidates;
        }
        result.stage = RunStage::Enriched;
        sort_by_views(&mut candidates);

        let validation = validate(candidates);
        result.validated = validation.candidates.len();
        result.excluded = validation.excluded();
        result.stage = RunStage::Validated;

        let ranked = assign_ranks(validation.candidates);
        result.stage = RunStage::Ranked;

        let persisted = self
            .accumulator
            .persist(&ranked, bucket_date, request.collection_run_id)
            .await;
        result.created = persisted.created;
        result.created_short_form = persisted.created_short_form;
        result.skipped = persisted.skipped;
        result.failed = persisted.failed;
        result.errors.extend(persisted.errors);
        result.stage = RunStage::Persisted;

        result.ranked = ranked;
        result.stage = RunStage::Done;

        tracing::info!(
            %bucket_date,
            extracted = result.extracted,
            enriched = result.enriched,
            validated = result.validated,
            created = result.created,
            skipped = result.skipped,
            failed = result.failed,
            outcome = ?result.outcome(),
            "collection run finished"
        );
        result
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
