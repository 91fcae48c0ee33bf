//! Database operations for `trending_videos`, the append-only daily snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use trendshorts_core::{Category, NewTrendingRecord, TrendingRecord};
use uuid::Uuid;

use crate::DbError;

const VIDEO_COLUMNS: &str = "id, youtube_id, title, description, channel_title, channel_id, \
     view_count, like_count, comment_count, published_at, duration, thumbnail_url, \
     category, tags, trending_rank, trending_date, region_code, is_shorts, \
     collection_run_id, created_at";

const JOINED_VIDEO_COLUMNS: &str = "t.id, t.youtube_id, t.title, t.description, \
     t.channel_title, t.channel_id, t.view_count, t.like_count, t.comment_count, \
     t.published_at, t.duration, t.thumbnail_url, t.category, t.tags, t.trending_rank, \
     t.trending_date, t.region_code, t.is_shorts, t.collection_run_id, t.created_at";

/// A row from the `trending_videos` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendingVideoRow {
    pub id: Uuid,
    pub youtube_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub channel_id: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: DateTime<Utc>,
    pub duration: String,
    pub thumbnail_url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub trending_rank: i32,
    pub trending_date: NaiveDate,
    pub region_code: String,
    pub is_shorts: bool,
    pub collection_run_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TrendingVideoRow {
    /// Converts the row into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] if the stored category or rank
    /// falls outside the domain.
    pub fn into_record(self) -> Result<TrendingRecord, DbError> {
        let category = self
            .category
            .parse::<Category>()
            .map_err(|e| DbError::InvalidStoredValue(e.to_string()))?;
        let rank = u32::try_from(self.trending_rank)
            .ok()
            .filter(|rank| *rank >= 1)
            .ok_or_else(|| {
                DbError::InvalidStoredValue(format!("trending_rank {}", self.trending_rank))
            })?;

        Ok(TrendingRecord {
            record_id: self.id,
            external_id: self.youtube_id,
            title: self.title,
            description: self.description,
            channel_name: self.channel_title,
            channel_external_id: self.channel_id,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            published_at: self.published_at,
            duration_iso: self.duration,
            thumbnail_url: self.thumbnail_url,
            category,
            tags: self.tags,
            rank,
            collection_date: self.trending_date,
            region_code: self.region_code.trim_end().to_string(),
            is_short_form: self.is_shorts,
            collection_run_id: self.collection_run_id,
            created_at: self.created_at,
        })
    }
}

/// A record of one date joined with its most recent earlier appearance.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RankedTrendingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: TrendingVideoRow,
    pub previous_rank: Option<i32>,
}

impl RankedTrendingRow {
    /// Positive when the video climbed since its previous appearance.
    #[must_use]
    pub fn rank_change(&self) -> Option<i32> {
        self.previous_rank
            .map(|previous| previous - self.video.trending_rank)
    }

    /// `true` when the video has no appearance inside the look-back window.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.previous_rank.is_none()
    }
}

/// Filters shared by the reporting listings.
#[derive(Debug, Clone, Copy)]
pub struct TrendingListFilter {
    pub date: NaiveDate,
    pub limit: i64,
    pub shorts_only: bool,
    pub exclude_music: bool,
}

impl TrendingListFilter {
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            limit: 50,
            shorts_only: false,
            exclude_music: true,
        }
    }
}

/// Returns `true` if a record already exists for `(youtube_id, trending_date)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn trending_video_exists(
    pool: &PgPool,
    youtube_id: &str,
    trending_date: NaiveDate,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS ( \
             SELECT 1 FROM trending_videos \
             WHERE youtube_id = $1 AND trending_date = $2 \
         )",
    )
    .bind(youtube_id)
    .bind(trending_date)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Inserts a new trending record. There is no update path: an existing
/// `(youtube_id, trending_date)` pair is reported as a duplicate.
///
/// # Errors
///
/// Returns [`DbError::Duplicate`] on a unique-constraint violation,
/// [`DbError::InvalidStoredValue`] if the rank does not fit the column, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn insert_trending_video(
    pool: &PgPool,
    record: &NewTrendingRecord,
) -> Result<TrendingVideoRow, DbError> {
    let rank = i32::try_from(record.rank)
        .map_err(|_| DbError::InvalidStoredValue(format!("trending_rank {}", record.rank)))?;

    sqlx::query_as::<_, TrendingVideoRow>(&format!(
        "INSERT INTO trending_videos ( \
             id, youtube_id, title, description, channel_title, channel_id, \
             view_count, like_count, comment_count, published_at, duration, thumbnail_url, \
             category, tags, trending_rank, trending_date, region_code, is_shorts, \
             collection_run_id \
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         RETURNING {VIDEO_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&record.external_id)
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.channel_name)
    .bind(&record.channel_external_id)
    .bind(record.view_count)
    .bind(record.like_count)
    .bind(record.comment_count)
    .bind(record.published_at)
    .bind(&record.duration_iso)
    .bind(&record.thumbnail_url)
    .bind(record.category.as_str())
    .bind(&record.tags)
    .bind(rank)
    .bind(record.collection_date)
    .bind(&record.region_code)
    .bind(record.is_short_form)
    .bind(record.collection_run_id)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_insert)
}

/// Lists the records of one date in rank order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trending_videos(
    pool: &PgPool,
    filter: TrendingListFilter,
) -> Result<Vec<TrendingVideoRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendingVideoRow>(&format!(
        "SELECT {VIDEO_COLUMNS} FROM trending_videos \
         WHERE trending_date = $1 \
           AND ($2 = FALSE OR is_shorts) \
           AND ($3 = FALSE OR category <> 'music') \
         ORDER BY trending_rank ASC \
         LIMIT $4"
    ))
    .bind(filter.date)
    .bind(filter.shorts_only)
    .bind(filter.exclude_music)
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists the records of one date, each joined with the rank of its most
/// recent earlier appearance within `lookback_days`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trending_with_previous_rank(
    pool: &PgPool,
    filter: TrendingListFilter,
    lookback_days: i32,
) -> Result<Vec<RankedTrendingRow>, DbError> {
    let rows = sqlx::query_as::<_, RankedTrendingRow>(&format!(
        "SELECT {JOINED_VIDEO_COLUMNS}, prev.trending_rank AS previous_rank \
         FROM trending_videos t \
         LEFT JOIN LATERAL ( \
             SELECT p.trending_rank FROM trending_videos p \
             WHERE p.youtube_id = t.youtube_id \
               AND p.trending_date < t.trending_date \
               AND p.trending_date >= t.trending_date - $5::INTEGER \
             ORDER BY p.trending_date DESC \
             LIMIT 1 \
         ) prev ON TRUE \
         WHERE t.trending_date = $1 \
           AND ($2 = FALSE OR t.is_shorts) \
           AND ($3 = FALSE OR t.category <> 'music') \
         ORDER BY t.trending_rank ASC \
         LIMIT $4"
    ))
    .bind(filter.date)
    .bind(filter.shorts_only)
    .bind(filter.exclude_music)
    .bind(filter.limit)
    .bind(lookback_days)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct collection dates, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trending_dates(pool: &PgPool, limit: i64) -> Result<Vec<NaiveDate>, DbError> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT DISTINCT trending_date FROM trending_videos \
         ORDER BY trending_date DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(dates)
}

/// Counts records strictly older than `cutoff`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_trending_videos_before(
    pool: &PgPool,
    cutoff: NaiveDate,
) -> Result<u64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM trending_videos WHERE trending_date < $1",
    )
    .bind(cutoff)
    .fetch_one(pool)
    .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Deletes records strictly older than `cutoff` and returns how many went.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_trending_videos_before(
    pool: &PgPool,
    cutoff: NaiveDate,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM trending_videos WHERE trending_date < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
