use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use trendshorts_db::CollectionRunRow;
use trendshorts_pipeline::TriggerSource;
use uuid::Uuid;

use crate::collector::TriggerError;
use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CollectionRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TriggerBody {
    pub max_candidates: Option<usize>,
    pub enhance: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectionRunItem {
    id: i64,
    collection_run_id: Uuid,
    trigger_source: String,
    status: String,
    bucket_date: NaiveDate,
    extracted_count: i32,
    enriched_count: i32,
    validated_count: i32,
    excluded_count: i32,
    created_count: i32,
    skipped_count: i32,
    failed_count: i32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CollectionRunRow> for CollectionRunItem {
    fn from(row: CollectionRunRow) -> Self {
        Self {
            id: row.id,
            collection_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            bucket_date: row.bucket_date,
            extracted_count: row.extracted_count,
            enriched_count: row.enriched_count,
            validated_count: row.validated_count,
            excluded_count: row.excluded_count,
            created_count: row.created_count,
            skipped_count: row.skipped_count,
            failed_count: row.failed_count,
            started_at: row.started_at,
            completed_at: row.completed_at,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_collection_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CollectionRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CollectionRunItem>>>, ApiError> {
    let rows = trendshorts_db::list_collection_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        rows.into_iter().map(CollectionRunItem::from).collect(),
    )))
}

/// Starts a collection in the background and answers with the queued run.
pub(super) async fn trigger_collection_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<TriggerBody>>,
) -> Result<(StatusCode, Json<ApiResponse<CollectionRunItem>>), ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let mut request = state.collector.default_request();
    if let Some(max) = body.max_candidates {
        if max == 0 {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "max_candidates must be at least 1",
            ));
        }
        request.max_candidates = max;
    }
    if let Some(enhance) = body.enhance {
        request.enhance = enhance;
    }

    match state.collector.spawn(TriggerSource::Api, request).await {
        Ok(run) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::new(req_id.0, CollectionRunItem::from(run))),
        )),
        Err(TriggerError::InFlight) => Err(ApiError::new(
            req_id.0,
            "conflict",
            "a collection run is already in progress",
        )),
        Err(TriggerError::Db(e)) => Err(map_db_error(req_id.0, &e)),
        Err(e @ TriggerError::Pipeline(_)) => {
            tracing::error!(error = %e, "collection trigger failed");
            Err(ApiError::new(req_id.0, "internal_error", e.to_string()))
        }
    }
}
