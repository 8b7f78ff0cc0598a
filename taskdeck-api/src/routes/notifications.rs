/// Notification endpoints (per-user, no org path)
///
/// # Endpoints
///
/// - `GET /v1/notifications` - Paginated list, meta carries unreadCount
/// - `GET /v1/notifications/unread-count`
/// - `PUT /v1/notifications/:id/read`
/// - `PUT /v1/notifications/read-all`
/// - `GET /v1/notifications/preferences`
/// - `PUT /v1/notifications/preferences`

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use taskdeck_shared::{
    auth::middleware::Identity,
    models::notification::Notification,
    models::user::{NotificationPrefs, User},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Pagination,
    response::{ApiResponse, Meta},
};

/// Preferences update body; absent fields are left unchanged
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrefsRequest {
    pub email: Option<bool>,
    pub in_app: Option<bool>,
}

/// List the acting user's notifications, newest first
///
/// `meta.unreadCount` rides along so clients can badge without a second
/// request.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let (page, limit, offset) = pagination.resolve();

    let notifications =
        Notification::list_by_recipient(&state.db, identity.id, limit, offset).await?;
    let total = Notification::count_by_recipient(&state.db, identity.id).await?;
    let unread = Notification::count_unread(&state.db, identity.id).await?;

    let meta = Meta {
        unread_count: Some(unread),
        ..Meta::paginated(page, limit, total)
    };

    Ok(Json(ApiResponse::ok_with_meta(notifications, meta)))
}

/// Unread count only
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let unread = Notification::count_unread(&state.db, identity.id).await?;

    Ok(Json(ApiResponse::ok(json!({ "unreadCount": unread }))))
}

/// Mark one notification as read
///
/// Scoped to the recipient: another user's notification id yields 404.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = Notification::mark_read(&state.db, id, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(ApiResponse::ok(notification)))
}

/// Mark all of the acting user's notifications as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let updated = Notification::mark_all_read(&state.db, identity.id).await?;

    Ok(Json(ApiResponse::ok(json!({ "updated": updated }))))
}

/// Current notification preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<NotificationPrefs>>> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(user.notification_prefs())))
}

/// Update notification preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdatePrefsRequest>,
) -> ApiResult<Json<ApiResponse<NotificationPrefs>>> {
    let user = User::update_notification_prefs(&state.db, identity.id, req.email, req.in_app)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(user.notification_prefs())))
}
