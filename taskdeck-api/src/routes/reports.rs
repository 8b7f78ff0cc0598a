/// Reporting endpoints (admin and manager)
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/reports/distribution/status`
/// - `GET /v1/orgs/:org_id/reports/distribution/priority`
/// - `GET /v1/orgs/:org_id/reports/completed-over-time?days=N`
/// - `GET /v1/orgs/:org_id/reports/export/csv`

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use taskdeck_shared::{
    access::permissions::Action,
    auth::middleware::Identity,
    reporting::{self, CompletedPoint, PriorityCount, StatusCount},
};

use crate::{
    app::AppState,
    error::ApiResult,
    extract::check_org_access,
    response::ApiResponse,
};

/// Default window for the completed-over-time series
const DEFAULT_DAYS: i32 = 30;

/// Query parameters for the completion series
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub days: Option<i32>,
}

/// Task counts by status
pub async fn status_distribution(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<StatusCount>>>> {
    check_org_access(&identity, Action::ReportView, org_id)?;

    let counts = reporting::status_counts(&state.db, org_id, None).await?;
    Ok(Json(ApiResponse::ok(counts)))
}

/// Task counts by priority
pub async fn priority_distribution(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<PriorityCount>>>> {
    check_org_access(&identity, Action::ReportView, org_id)?;

    let counts = reporting::priority_counts(&state.db, org_id, None).await?;
    Ok(Json(ApiResponse::ok(counts)))
}

/// Per-day completed-task counts over the last N days (default 30)
pub async fn completed_over_time(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<SeriesQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CompletedPoint>>>> {
    check_org_access(&identity, Action::ReportView, org_id)?;

    let days = query.days.unwrap_or(DEFAULT_DAYS).clamp(1, 365);
    let series = reporting::completed_over_time(&state.db, org_id, days).await?;

    Ok(Json(ApiResponse::ok(series)))
}

/// CSV export of all organization tasks
///
/// Returned as a `text/csv` attachment rather than the JSON envelope.
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Response> {
    check_org_access(&identity, Action::ReportExport, org_id)?;

    let rows = reporting::export_rows(&state.db, org_id).await?;
    let csv = reporting::render_csv(&rows);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tasks.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
