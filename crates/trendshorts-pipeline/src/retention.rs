//! Removes trending records (and optionally stats) older than a cut-off.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use trendshorts_db::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionReport {
    pub cutoff: NaiveDate,
    pub dry_run: bool,
    /// Records removed, or that would be removed on a dry run.
    pub videos: u64,
    /// Stats rows removed; always zero on a dry run or with `keep_stats`.
    pub stats: u64,
}

/// `today - days`, saturating at the earliest representable date.
#[must_use]
pub fn retention_cutoff(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Deletes everything dated strictly before `cutoff`.
///
/// # Errors
///
/// Returns [`DbError`] if a count or delete query fails.
pub async fn apply_retention(
    pool: &PgPool,
    cutoff: NaiveDate,
    keep_stats: bool,
    dry_run: bool,
) -> Result<RetentionReport, DbError> {
    if dry_run {
        let videos = trendshorts_db::count_trending_videos_before(pool, cutoff).await?;
        return Ok(RetentionReport {
            cutoff,
            dry_run,
            videos,
            stats: 0,
        });
    }

    let videos = trendshorts_db::delete_trending_videos_before(pool, cutoff).await?;
    let stats = if keep_stats {
        0
    } else {
        trendshorts_db::delete_trending_stats_before(pool, cutoff).await?
    };
    tracing::info!(%cutoff, videos, stats, "retention cleanup finished");

    Ok(RetentionReport {
        cutoff,
        dry_run,
        videos,
        stats,
    })
}
