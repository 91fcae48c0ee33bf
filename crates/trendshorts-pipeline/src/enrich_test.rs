use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::time::Instant;
use trendshorts_core::Category;

use super::*;
use crate::cache::MokaMetadataCache;

#[derive(Default)]
struct Shared {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    providers_built: AtomicUsize,
    called_at: Mutex<Vec<Instant>>,
}

struct FakeProvider {
    responses: Arc<HashMap<String, VideoMetadata>>,
    shared: Arc<Shared>,
    latency: Duration,
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata, ProviderError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        self.shared.called_at.lock().unwrap().push(Instant::now());
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses
            .get(video_id)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable {
                video_id: video_id.to_owned(),
            })
    }
}

fn factory(
    responses: HashMap<String, VideoMetadata>,
    latency: Duration,
) -> (ProviderFactory, Arc<Shared>) {
    let shared = Arc::new(Shared::default());
    let responses = Arc::new(responses);
    let handle = Arc::clone(&shared);
    let factory: ProviderFactory = Arc::new(move || {
        handle.providers_built.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeProvider {
            responses: Arc::clone(&responses),
            shared: Arc::clone(&handle),
            latency,
        }) as Box<dyn MetadataProvider>
    });
    (factory, shared)
}

fn options() -> EnrichOptions {
    EnrichOptions {
        sequential_delay: Duration::ZERO,
        ..EnrichOptions::default()
    }
}

fn candidate(id: &str) -> Candidate {
    Candidate::new(id, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn meta(id: &str, views: i64) -> VideoMetadata {
    VideoMetadata {
        video_id: id.to_owned(),
        title: format!("title {id}"),
        view_count: views,
        like_count: 7,
        comment_count: 3,
        duration_secs: 30,
        categories: vec!["Comedy".to_owned()],
        ..VideoMetadata::default()
    }
}

fn ids() -> Vec<&'static str> {
    vec!["AAAAAAAA", "BBBBBBBB", "CCCCCCCC", "DDDDDDDD", "EEEEEEEE", "FFFFFFFF"]
}

#[tokio::test]
async fn all_failures_return_input_unchanged() {
    let (providers, shared) = factory(HashMap::new(), Duration::ZERO);
    let enricher = MetadataEnricher::new(Arc::new(MokaMetadataCache::new(64)), providers, options());
    let input: Vec<Candidate> = ids().into_iter().map(candidate).collect();

    let report = enricher.enrich(input.clone(), true, 3).await;

    assert_eq!(report.candidates, input);
    assert_eq!(report.enriched, 0);
    assert_eq!(report.failures.len(), input.len());
    assert_eq!(shared.calls.load(Ordering::SeqCst), input.len());
}

#[tokio::test]
async fn parallel_output_is_index_aligned_with_input() {
    let responses: HashMap<_, _> = ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.to_owned(), meta(id, (i64::try_from(i).unwrap() + 1) * 100)))
        .collect();
    let (providers, _) = factory(responses, Duration::from_millis(5));
    let enricher = MetadataEnricher::new(Arc::new(MokaMetadataCache::new(64)), providers, options());
    let input: Vec<Candidate> = ids().into_iter().map(candidate).collect();

    let report = enricher.enrich(input, true, 4).await;

    let got: Vec<(&str, i64)> = report
        .candidates
        .iter()
        .map(|c| (c.external_id(), c.view_count))
        .collect();
    assert_eq!(
        got,
        [
            ("AAAAAAAA", 100),
            ("BBBBBBBB", 200),
            ("CCCCCCCC", 300),
            ("DDDDDDDD", 400),
            ("EEEEEEEE", 500),
            ("FFFFFFFF", 600)
        ]
    );
    assert_eq!(report.enriched, 6);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn worker_pool_is_bounded_and_each_worker_owns_a_provider() {
    let responses: HashMap<_, _> = ids()
        .into_iter()
        .map(|id| (id.to_owned(), meta(id, 1)))
        .collect();
    let (providers, shared) = factory(responses, Duration::from_millis(20));
    let enricher = MetadataEnricher::new(Arc::new(MokaMetadataCache::new(64)), providers, options());

    enricher
        .enrich(ids().into_iter().map(candidate).collect(), true, 2)
        .await;

    assert_eq!(shared.providers_built.load(Ordering::SeqCst), 2);
    assert_eq!(shared.max_in_flight.load(Ordering::SeqCst), 2);
    assert_eq!(shared.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn sequential_mode_uses_one_provider_one_call_at_a_time() {
    let responses: HashMap<_, _> = ids()
        .into_iter()
        .map(|id| (id.to_owned(), meta(id, 1)))
        .collect();
    let (providers, shared) = factory(responses, Duration::from_millis(2));
    let enricher = MetadataEnricher::new(Arc::new(MokaMetadataCache::new(64)), providers, options());

    let report = enricher
        .enrich(ids().into_iter().map(candidate).collect(), false, 6)
        .await;

    assert_eq!(report.enriched, 6);
    assert_eq!(shared.providers_built.load(Ordering::SeqCst), 1);
    assert_eq!(shared.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn sequential_mode_waits_between_calls_but_not_before_the_first() {
    let delay = Duration::from_millis(300);
    let (providers, shared) = factory(HashMap::new(), Duration::ZERO);
    let enricher = MetadataEnricher::new(
        Arc::new(MokaMetadataCache::new(64)),
        providers,
        EnrichOptions {
            sequential_delay: delay,
            ..EnrichOptions::default()
        },
    );
    let input: Vec<Candidate> = ids().into_iter().take(4).map(candidate).collect();

    let started = Instant::now();
    let report = enricher.enrich(input, false, 6).await;

    assert_eq!(report.failures.len(), 4);
    assert!(started.elapsed() >= delay * 3);

    let called_at = shared.called_at.lock().unwrap().clone();
    assert_eq!(called_at.len(), 4);
    assert_eq!(called_at[0], started);
    for pair in called_at.windows(2) {
        assert!(pair[1] - pair[0] >= delay);
    }
}

#[tokio::test(start_paused = true)]
async fn parallel_mode_does_not_apply_the_sequential_delay() {
    let (providers, _) = factory(HashMap::new(), Duration::ZERO);
    let enricher = MetadataEnricher::new(
        Arc::new(MokaMetadataCache::new(64)),
        providers,
        EnrichOptions {
            sequential_delay: Duration::from_secs(5),
            ..EnrichOptions::default()
        },
    );

    let started = Instant::now();
    enricher
        .enrich(ids().into_iter().map(candidate).collect(), true, 3)
        .await;

    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn cache_hits_skip_the_provider_and_fetches_fill_the_cache() {
    let cache = Arc::new(MokaMetadataCache::new(64));
    cache.insert("AAAAAAAA", meta("AAAAAAAA", 999), Duration::from_secs(60));

    let responses: HashMap<_, _> = [("BBBBBBBB".to_owned(), meta("BBBBBBBB", 5))].into();
    let (providers, shared) = factory(responses, Duration::ZERO);
    let enricher = MetadataEnricher::new(cache.clone(), providers, options());

    let report = enricher
        .enrich(vec![candidate("AAAAAAAA"), candidate("BBBBBBBB")], true, 4)
        .await;

    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.enriched, 2);
    assert_eq!(report.candidates[0].view_count, 999);
    assert_eq!(shared.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get("BBBBBBBB").unwrap().view_count, 5);
}

#[tokio::test]
async fn mismatched_provider_id_is_a_failure() {
    let responses: HashMap<_, _> = [("AAAAAAAA".to_owned(), meta("ZZZZZZZZ", 50))].into();
    let (providers, _) = factory(responses, Duration::ZERO);
    let cache = Arc::new(MokaMetadataCache::new(64));
    let enricher = MetadataEnricher::new(cache.clone(), providers, options());

    let report = enricher.enrich(vec![candidate("AAAAAAAA")], true, 4).await;

    assert_eq!(report.candidates[0], candidate("AAAAAAAA"));
    assert!(matches!(
        report.failures[0].error,
        ProviderError::IdMismatch { .. }
    ));
    assert!(cache.get("AAAAAAAA").is_none());
}

#[test]
fn merge_overrides_only_reported_values() {
    let mut c = candidate("AAAAAAAA");
    c.title = "Page title".to_owned();
    c.view_count = 40;
    c.thumbnail_url = "page.jpg".to_owned();

    let provider = VideoMetadata {
        title: "   ".to_owned(),
        like_count: 9,
        description: "desc".to_owned(),
        tags: vec!["x".to_owned()],
        duration_secs: 75,
        categories: vec!["Science & Technology".to_owned()],
        ..VideoMetadata::default()
    };
    merge_metadata(&mut c, &provider);

    assert_eq!(c.external_id(), "AAAAAAAA");
    assert_eq!(c.title, "Page title");
    assert_eq!(c.view_count, 40);
    assert_eq!(c.thumbnail_url, "page.jpg");
    assert_eq!(c.like_count, 9);
    assert_eq!(c.comment_count, 0);
    assert_eq!(c.description, "desc");
    assert_eq!(c.tags, ["x"]);
    assert_eq!(c.category, Category::Tech);
    assert_eq!(c.duration_iso, "PT1M15S");
    assert!(!c.is_short_form);
}

#[test]
fn merge_takes_reported_values() {
    let mut c = candidate("AAAAAAAA");
    let published = Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap();
    let provider = VideoMetadata {
        title: "Real".to_owned(),
        channel_name: "Chan".to_owned(),
        channel_external_id: "UC1".to_owned(),
        view_count: 12,
        thumbnail_url: "t.jpg".to_owned(),
        published_at: Some(published),
        duration_secs: 59,
        ..VideoMetadata::default()
    };
    merge_metadata(&mut c, &provider);

    assert_eq!(c.title, "Real");
    assert_eq!(c.channel_name, "Chan");
    assert_eq!(c.channel_external_id, "UC1");
    assert_eq!(c.view_count, 12);
    assert_eq!(c.thumbnail_url, "t.jpg");
    assert_eq!(c.published_at, published);
    assert_eq!(c.duration_iso, "PT59S");
    assert_eq!(c.category, Category::Other);
    assert!(c.is_short_form);
}
