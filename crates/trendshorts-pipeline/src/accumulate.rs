//! Idempotent, day-bucketed persistence of ranked candidates.

use std::sync::Arc;

use chrono::NaiveDate;
use trendshorts_core::{Candidate, NewTrendingRecord};

use crate::store::{StoreError, TrendingStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub created: usize,
    pub created_short_form: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

pub struct AccumulationStore {
    store: Arc<dyn TrendingStore>,
    region_code: String,
}

impl AccumulationStore {
    #[must_use]
    pub fn new(store: Arc<dyn TrendingStore>, region_code: impl Into<String>) -> Self {
        Self {
            store,
            region_code: region_code.into(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TrendingStore> {
        &self.store
    }

    /// Writes each candidate once per `bucket_date`, in the given (rank) order.
    ///
    /// An existing `(external_id, bucket_date)` pair is a skip, whether found
    /// by the pre-check or reported by the store as a duplicate on insert.
    /// Any other per-item failure is counted and the batch continues.
    pub async fn persist(
        &self,
        candidates: &[Candidate],
        bucket_date: NaiveDate,
        collection_run_id: Option<i64>,
    ) -> PersistReport {
        let mut report = PersistReport::default();

        for candidate in candidates {
            let video_id = candidate.external_id();

            match self.store.exists(video_id, bucket_date).await {
                Ok(true) => {
                    tracing::debug!(video_id, %bucket_date, "already collected for date");
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    record_failure(&mut report, video_id, &e.to_string());
                    continue;
                }
            }

            let record = match NewTrendingRecord::from_candidate(
                candidate,
                bucket_date,
                &self.region_code,
                collection_run_id,
            ) {
                Ok(record) => record,
                Err(e) => {
                    record_failure(&mut report, video_id, &e.to_string());
                    continue;
                }
            };

            match self.store.create(record).await {
                Ok(stored) => {
                    report.created += 1;
                    if stored.is_short_form {
                        report.created_short_form += 1;
                    }
                }
                Err(StoreError::Duplicate { .. }) => {
                    tracing::debug!(video_id, %bucket_date, "lost insert race, counting as skip");
                    report.skipped += 1;
                }
                Err(e) => record_failure(&mut report, video_id, &e.to_string()),
            }
        }

        tracing::info!(
            %bucket_date,
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            "persisted trending records"
        );
        report
    }
}

fn record_failure(report: &mut PersistReport, video_id: &str, error: &str) {
    tracing::warn!(video_id, error, "failed to persist trending record");
    report.failed += 1;
    report.errors.push(format!("{video_id}: {error}"));
}
