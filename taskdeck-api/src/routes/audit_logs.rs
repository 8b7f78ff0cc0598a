/// Audit log endpoint (admin only)
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/audit-logs` with page/limit/action/resource/
///   userId/from/to query parameters

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use taskdeck_shared::{
    access::permissions::Action,
    auth::middleware::Identity,
    models::audit_log::{AuditFilter, AuditLog},
};

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{check_org_access, Pagination},
    response::{ApiResponse, Meta},
};

/// Query parameters for audit-log listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// List audit entries, newest first
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AuditLog>>>> {
    check_org_access(&identity, Action::AuditView, org_id)?;

    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit, offset) = pagination.resolve();

    let filter = AuditFilter {
        action: query.action,
        resource: query.resource,
        user_id: query.user_id,
        from: query.from,
        to: query.to,
    };

    let entries = AuditLog::list_by_org(&state.db, org_id, &filter, limit, offset).await?;
    let total = AuditLog::count_by_org(&state.db, org_id, &filter).await?;

    Ok(Json(ApiResponse::ok_with_meta(
        entries,
        Meta::paginated(page, limit, total),
    )))
}
