//! Per-date collection statistics in `trending_stats`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

const STATS_COLUMNS: &str = "collection_date, total_videos_collected, shorts_collected, \
     successful_collections, failed_collections, created_at, updated_at";

/// A row from the `trending_stats` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendingStatsRow {
    pub collection_date: NaiveDate,
    pub total_videos_collected: i32,
    pub shorts_collected: i32,
    pub successful_collections: i32,
    pub failed_collections: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate over a window of `trending_stats` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TrendingStatsSummary {
    pub days: i64,
    pub total_videos_collected: i64,
    pub shorts_collected: i64,
    pub successful_collections: i64,
    pub failed_collections: i64,
}

/// Folds one finished run into the stats row for `collection_date`.
///
/// A successful run adds its created counts; a failed run only bumps
/// `failed_collections`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn record_collection_outcome(
    pool: &PgPool,
    collection_date: NaiveDate,
    videos_created: i32,
    shorts_created: i32,
    succeeded: bool,
) -> Result<TrendingStatsRow, DbError> {
    let (videos, shorts, ok, failed) = if succeeded {
        (videos_created, shorts_created, 1, 0)
    } else {
        (0, 0, 0, 1)
    };

    let row = sqlx::query_as::<_, TrendingStatsRow>(&format!(
        "INSERT INTO trending_stats ( \
             collection_date, total_videos_collected, shorts_collected, \
             successful_collections, failed_collections \
         ) VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (collection_date) DO UPDATE SET \
             total_videos_collected = trending_stats.total_videos_collected + EXCLUDED.total_videos_collected, \
             shorts_collected       = trending_stats.shorts_collected + EXCLUDED.shorts_collected, \
             successful_collections = trending_stats.successful_collections + EXCLUDED.successful_collections, \
             failed_collections     = trending_stats.failed_collections + EXCLUDED.failed_collections, \
             updated_at             = NOW() \
         RETURNING {STATS_COLUMNS}"
    ))
    .bind(collection_date)
    .bind(videos)
    .bind(shorts)
    .bind(ok)
    .bind(failed)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches the stats row for one date.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has been recorded for the date, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_trending_stats(
    pool: &PgPool,
    collection_date: NaiveDate,
) -> Result<TrendingStatsRow, DbError> {
    sqlx::query_as::<_, TrendingStatsRow>(&format!(
        "SELECT {STATS_COLUMNS} FROM trending_stats WHERE collection_date = $1"
    ))
    .bind(collection_date)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Stats rows on or after `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trending_stats(
    pool: &PgPool,
    since: NaiveDate,
) -> Result<Vec<TrendingStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendingStatsRow>(&format!(
        "SELECT {STATS_COLUMNS} FROM trending_stats \
         WHERE collection_date >= $1 \
         ORDER BY collection_date DESC"
    ))
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sums the stats rows on or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn summarize_trending_stats(
    pool: &PgPool,
    since: NaiveDate,
) -> Result<TrendingStatsSummary, DbError> {
    let summary = sqlx::query_as::<_, TrendingStatsSummary>(
        "SELECT COUNT(*)::BIGINT AS days, \
                COALESCE(SUM(total_videos_collected), 0)::BIGINT AS total_videos_collected, \
                COALESCE(SUM(shorts_collected), 0)::BIGINT AS shorts_collected, \
                COALESCE(SUM(successful_collections), 0)::BIGINT AS successful_collections, \
                COALESCE(SUM(failed_collections), 0)::BIGINT AS failed_collections \
         FROM trending_stats \
         WHERE collection_date >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

/// Deletes stats rows strictly older than `cutoff`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_trending_stats_before(
    pool: &PgPool,
    cutoff: NaiveDate,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM trending_stats WHERE collection_date < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
