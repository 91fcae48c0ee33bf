use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use trendshorts_core::{format_clock_duration, format_compact_count};
use trendshorts_db::{RankedTrendingRow, TrendingListFilter, TrendingStatsRow, TrendingStatsSummary};
use trendshorts_pipeline::retention_cutoff;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

const RANK_LOOKBACK_DAYS: i32 = 7;
const DEFAULT_STATS_DAYS: u32 = 7;
const MAX_STATS_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct TrendingQuery {
    pub date: Option<String>,
    pub limit: Option<i64>,
    pub include_music: Option<bool>,
    pub shorts_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DatesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrendingItem {
    #[serde(flatten)]
    row: RankedTrendingRow,
    rank_change: Option<i32>,
    is_new: bool,
    view_count_display: String,
    duration_display: String,
}

impl From<RankedTrendingRow> for TrendingItem {
    fn from(row: RankedTrendingRow) -> Self {
        Self {
            rank_change: row.rank_change(),
            is_new: row.is_new(),
            view_count_display: format_compact_count(row.video.view_count),
            duration_display: format_clock_duration(&row.video.duration),
            row,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TrendingList {
    date: Option<NaiveDate>,
    items: Vec<TrendingItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrendingStats {
    since: NaiveDate,
    summary: TrendingStatsSummary,
    daily: Vec<TrendingStatsRow>,
}

fn parse_date(request_id: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("date must be YYYY-MM-DD, got \"{raw}\""),
        )
    })
}

pub(super) async fn list_trending(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<ApiResponse<TrendingList>>, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => Some(parse_date(&req_id.0, raw)?),
        None => trendshorts_db::list_trending_dates(&state.pool, 1)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
            .into_iter()
            .next(),
    };

    let Some(date) = date else {
        return Ok(Json(ApiResponse::new(
            req_id.0,
            TrendingList {
                date: None,
                items: Vec::new(),
            },
        )));
    };

    let filter = TrendingListFilter {
        limit: normalize_limit(query.limit),
        shorts_only: query.shorts_only.unwrap_or(false),
        exclude_music: !query.include_music.unwrap_or(false),
        ..TrendingListFilter::for_date(date)
    };
    let rows =
        trendshorts_db::list_trending_with_previous_rank(&state.pool, filter, RANK_LOOKBACK_DAYS)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        TrendingList {
            date: Some(date),
            items: rows.into_iter().map(TrendingItem::from).collect(),
        },
    )))
}

pub(super) async fn list_trending_dates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DatesQuery>,
) -> Result<Json<ApiResponse<Vec<NaiveDate>>>, ApiError> {
    let dates = trendshorts_db::list_trending_dates(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, dates)))
}

pub(super) async fn trending_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<TrendingStats>>, ApiError> {
    let days = query
        .days
        .unwrap_or(DEFAULT_STATS_DAYS)
        .clamp(1, MAX_STATS_DAYS);
    let since = stats_window_start(Utc::now().date_naive(), days);

    let summary = trendshorts_db::summarize_trending_stats(&state.pool, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let daily = trendshorts_db::list_trending_stats(&state.pool, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        TrendingStats {
            since,
            summary,
            daily,
        },
    )))
}

/// First day of a `days`-long window ending today (inclusive).
pub(super) fn stats_window_start(today: NaiveDate, days: u32) -> NaiveDate {
    retention_cutoff(today, days.saturating_sub(1))
}
