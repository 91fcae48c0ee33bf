//! Concurrent per-video metadata enrichment with per-item fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use trendshorts_core::{Candidate, VideoMetadata};
use trendshorts_scraper::{MetadataProvider, ProviderError};

use crate::cache::MetadataCache;

/// Builds one provider per worker; workers never share a provider instance.
pub type ProviderFactory = Arc<dyn Fn() -> Box<dyn MetadataProvider> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    pub parallel: bool,
    pub worker_count: usize,
    pub sequential_delay: Duration,
    pub cache_ttl: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_count: 6,
            sequential_delay: Duration::from_millis(300),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Result of one lookup.
#[derive(Debug)]
pub enum FetchOutcome {
    Cached(VideoMetadata),
    Fetched(VideoMetadata),
    Failed(ProviderError),
}

#[derive(Debug)]
pub struct EnrichFailure {
    pub video_id: String,
    pub error: ProviderError,
}

/// Enriched batch, index-aligned with the input.
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    pub candidates: Vec<Candidate>,
    pub enriched: usize,
    pub cache_hits: usize,
    pub failures: Vec<EnrichFailure>,
}

pub struct MetadataEnricher {
    cache: Arc<dyn MetadataCache>,
    providers: ProviderFactory,
    options: EnrichOptions,
}

impl MetadataEnricher {
    #[must_use]
    pub fn new(
        cache: Arc<dyn MetadataCache>,
        providers: ProviderFactory,
        options: EnrichOptions,
    ) -> Self {
        Self {
            cache,
            providers,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> EnrichOptions {
        self.options
    }

    /// Enriches `candidates` in place of order: output position `i` is input
    /// position `i`, enriched or unchanged.
    ///
    /// A failed lookup leaves its candidate untouched and is reported in
    /// [`EnrichmentReport::failures`]; it never aborts the batch.
    pub async fn enrich(
        &self,
        candidates: Vec<Candidate>,
        parallel: bool,
        worker_count: usize,
    ) -> EnrichmentReport {
        let mut outcomes: Vec<Option<FetchOutcome>> = candidates
            .iter()
            .map(|c| self.cache.get(c.external_id()).map(FetchOutcome::Cached))
            .collect();

        let misses: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter_map(|(idx, outcome)| outcome.is_none().then_some(idx))
            .collect();
        let ids: Vec<&str> = candidates.iter().map(Candidate::external_id).collect();

        tracing::info!(
            total = candidates.len(),
            cache_hits = candidates.len() - misses.len(),
            to_fetch = misses.len(),
            parallel,
            worker_count,
            "enriching candidates"
        );

        let fetched = if parallel && misses.len() > 1 {
            self.fetch_parallel(&ids, &misses, worker_count.max(1)).await
        } else {
            self.fetch_sequential(&ids, &misses).await
        };
        for (idx, outcome) in fetched {
            outcomes[idx] = Some(outcome);
        }

        let mut report = EnrichmentReport {
            candidates: Vec::with_capacity(candidates.len()),
            ..EnrichmentReport::default()
        };

        for (mut candidate, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                Some(FetchOutcome::Cached(meta)) => {
                    merge_metadata(&mut candidate, &meta);
                    report.enriched += 1;
                    report.cache_hits += 1;
                }
                Some(FetchOutcome::Fetched(meta)) => {
                    self.cache
                        .insert(candidate.external_id(), meta.clone(), self.options.cache_ttl);
                    merge_metadata(&mut candidate, &meta);
                    report.enriched += 1;
                }
                Some(FetchOutcome::Failed(error)) => {
                    tracing::warn!(
                        video_id = %candidate.external_id(),
                        error = %error,
                        "metadata lookup failed, keeping page data"
                    );
                    report.failures.push(EnrichFailure {
                        video_id: candidate.external_id().to_owned(),
                        error,
                    });
                }
                None => {}
            }
            report.candidates.push(candidate);
        }

        tracing::info!(
            enriched = report.enriched,
            failed = report.failures.len(),
            "enrichment finished"
        );
        report
    }

    async fn fetch_sequential(&self, ids: &[&str], misses: &[usize]) -> Vec<(usize, FetchOutcome)> {
        let provider = (self.providers)();
        let mut results = Vec::with_capacity(misses.len());
        for (n, &idx) in misses.iter().enumerate() {
            if n > 0 && !self.options.sequential_delay.is_zero() {
                tokio::time::sleep(self.options.sequential_delay).await;
            }
            results.push((idx, fetch_one(provider.as_ref(), ids[idx]).await));
        }
        results
    }

    async fn fetch_parallel(
        &self,
        ids: &[&str],
        misses: &[usize],
        worker_count: usize,
    ) -> Vec<(usize, FetchOutcome)> {
        let next = AtomicUsize::new(0);
        let workers = (0..worker_count.min(misses.len())).map(|worker| {
            let provider = (self.providers)();
            let next = &next;
            async move {
                let mut results = Vec::new();
                loop {
                    let slot = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&idx) = misses.get(slot) else {
                        break;
                    };
                    tracing::debug!(worker, video_id = ids[idx], "fetching metadata");
                    results.push((idx, fetch_one(provider.as_ref(), ids[idx]).await));
                }
                results
            }
        });

        join_all(workers).await.into_iter().flatten().collect()
    }
}

async fn fetch_one(provider: &dyn MetadataProvider, video_id: &str) -> FetchOutcome {
    match provider.fetch_metadata(video_id).await {
        Ok(meta) if !meta.video_id.is_empty() && meta.video_id != video_id => {
            FetchOutcome::Failed(ProviderError::IdMismatch {
                requested: video_id.to_owned(),
                returned: meta.video_id,
            })
        }
        Ok(meta) => FetchOutcome::Fetched(meta),
        Err(error) => FetchOutcome::Failed(error),
    }
}

/// Folds provider metadata into `candidate` without touching its identity.
///
/// `title`, `channel_name`, `channel_external_id`, `view_count`,
/// `thumbnail_url` and `published_at` override only when the provider
/// reported a value. `like_count`, `comment_count`, `description`, `tags`
/// and `category` are taken from the provider as-is. Duration and the
/// short-form flag follow the provider's duration.
pub fn merge_metadata(candidate: &mut Candidate, meta: &VideoMetadata) {
    if !meta.title.trim().is_empty() {
        candidate.title.clone_from(&meta.title);
    }
    if !meta.channel_name.is_empty() {
        candidate.channel_name.clone_from(&meta.channel_name);
    }
    if !meta.channel_external_id.is_empty() {
        candidate
            .channel_external_id
            .clone_from(&meta.channel_external_id);
    }
    if meta.view_count > 0 {
        candidate.view_count = meta.view_count;
    }
    if !meta.thumbnail_url.is_empty() {
        candidate.thumbnail_url.clone_from(&meta.thumbnail_url);
    }
    if let Some(published_at) = meta.published_at {
        candidate.published_at = published_at;
    }

    candidate.like_count = meta.like_count;
    candidate.comment_count = meta.comment_count;
    candidate.description.clone_from(&meta.description);
    candidate.tags.clone_from(&meta.tags);
    candidate.category = meta.category();
    candidate.duration_iso = meta.duration_iso();
    candidate.is_short_form = meta.is_short_form();
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod tests;
