/// Dashboard endpoint
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/dashboard/summary`

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use taskdeck_shared::{
    access::permissions::{has_permission, Action},
    auth::middleware::Identity,
    reporting::{self, DashboardStats},
};

use crate::{
    app::AppState,
    error::ApiResult,
    extract::check_org_access,
    response::ApiResponse,
};

/// Dashboard summary
///
/// Admins and managers see organization-wide numbers; members see only
/// tasks assigned to them.
pub async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    check_org_access(&identity, Action::DashboardViewOwn, org_id)?;

    let scope_user = if has_permission(identity.role, Action::DashboardViewAll) {
        None
    } else {
        Some(identity.id)
    };

    let stats = reporting::dashboard_stats(&state.db, org_id, scope_user).await?;

    Ok(Json(ApiResponse::ok(stats)))
}
