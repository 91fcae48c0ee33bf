//! Durable store capability for trending records.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use thiserror::Error;
use trendshorts_core::{NewTrendingRecord, TrendingRecord};
use trendshorts_db::{DbError, TrendingListFilter};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record for {external_id} on {date} already exists")]
    Duplicate {
        external_id: String,
        date: NaiveDate,
    },
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Append-only storage keyed by `(external_id, collection_date)`.
///
/// `create` must reject an existing pair with [`StoreError::Duplicate`];
/// there is no update path.
#[async_trait]
pub trait TrendingStore: Send + Sync {
    async fn exists(&self, external_id: &str, date: NaiveDate) -> Result<bool, StoreError>;

    async fn create(&self, record: NewTrendingRecord) -> Result<TrendingRecord, StoreError>;

    /// Records of one date in rank order.
    async fn list_for_date(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TrendingRecord>, StoreError>;
}

/// Postgres-backed store over the `trending_videos` table.
#[derive(Clone)]
pub struct PgTrendingStore {
    pool: PgPool,
}

impl PgTrendingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrendingStore for PgTrendingStore {
    async fn exists(&self, external_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(trendshorts_db::trending_video_exists(&self.pool, external_id, date).await?)
    }

    async fn create(&self, record: NewTrendingRecord) -> Result<TrendingRecord, StoreError> {
        match trendshorts_db::insert_trending_video(&self.pool, &record).await {
            Ok(row) => Ok(row.into_record()?),
            Err(DbError::Duplicate) => Err(StoreError::Duplicate {
                external_id: record.external_id,
                date: record.collection_date,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_for_date(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TrendingRecord>, StoreError> {
        let filter = TrendingListFilter {
            date,
            limit: i64::try_from(limit).unwrap_or(i64::MAX),
            shorts_only: false,
            exclude_music: false,
        };
        trendshorts_db::list_trending_videos(&self.pool, filter)
            .await?
            .into_iter()
            .map(|row| row.into_record().map_err(StoreError::from))
            .collect()
    }
}

/// In-process store used for dry runs and tests.
#[derive(Default)]
pub struct MemoryTrendingStore {
    records: Mutex<BTreeMap<(NaiveDate, String), TrendingRecord>>,
}

impl MemoryTrendingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored records, ordered by date then rank.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TrendingRecord> {
        let mut records: Vec<TrendingRecord> = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.collection_date, r.rank));
        records
    }
}

#[async_trait]
impl TrendingStore for MemoryTrendingStore {
    async fn exists(&self, external_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(date, external_id.to_owned())))
    }

    async fn create(&self, record: NewTrendingRecord) -> Result<TrendingRecord, StoreError> {
        let key = (record.collection_date, record.external_id.clone());
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate {
                external_id: key.1,
                date: key.0,
            });
        }
        let stored = record.into_record(Uuid::new_v4(), Utc::now());
        records.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_for_date(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TrendingRecord>, StoreError> {
        let mut rows: Vec<TrendingRecord> = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|r| r.collection_date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.rank);
        rows.truncate(limit);
        Ok(rows)
    }
}
