//! Process-wide metadata cache shared by concurrent enrichment workers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;
use trendshorts_core::VideoMetadata;

/// Concurrent get / set-with-TTL keyed by video id.
///
/// Racing inserts for the same key are harmless: entries are re-derivations
/// of the same upstream data.
pub trait MetadataCache: Send + Sync {
    fn get(&self, video_id: &str) -> Option<VideoMetadata>;
    fn insert(&self, video_id: &str, metadata: VideoMetadata, ttl: Duration);
}

#[derive(Clone)]
struct CachedMetadata {
    metadata: Arc<VideoMetadata>,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedMetadata> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedMetadata,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedMetadata,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-memory cache backed by `moka`.
#[derive(Clone)]
pub struct MokaMetadataCache {
    inner: Cache<String, CachedMetadata>,
}

impl MokaMetadataCache {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl MetadataCache for MokaMetadataCache {
    fn get(&self, video_id: &str) -> Option<VideoMetadata> {
        self.inner
            .get(video_id)
            .map(|entry| entry.metadata.as_ref().clone())
    }

    fn insert(&self, video_id: &str, metadata: VideoMetadata, ttl: Duration) {
        self.inner.insert(
            video_id.to_owned(),
            CachedMetadata {
                metadata: Arc::new(metadata),
                ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str) -> VideoMetadata {
        VideoMetadata {
            title: title.to_owned(),
            ..VideoMetadata::default()
        }
    }

    #[test]
    fn get_returns_inserted_entry() {
        let cache = MokaMetadataCache::new(16);
        assert!(cache.get("AAAAAAAA").is_none());

        cache.insert("AAAAAAAA", meta("hello"), Duration::from_secs(60));
        assert_eq!(cache.get("AAAAAAAA").unwrap().title, "hello");
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn reinsert_replaces_value() {
        let cache = MokaMetadataCache::new(16);
        cache.insert("AAAAAAAA", meta("old"), Duration::from_secs(60));
        cache.insert("AAAAAAAA", meta("new"), Duration::from_secs(60));
        assert_eq!(cache.get("AAAAAAAA").unwrap().title, "new");
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = MokaMetadataCache::new(16);
        cache.insert("AAAAAAAA", meta("stale"), Duration::ZERO);
        assert!(cache.get("AAAAAAAA").is_none());
    }

    #[test]
    fn usable_from_many_threads() {
        let cache = Arc::new(MokaMetadataCache::new(1_000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("vid{i:05}");
                        cache.insert(&id, meta(&format!("t{t}")), Duration::from_secs(60));
                        assert!(cache.get(&id).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.entry_count(), 50);
    }
}
