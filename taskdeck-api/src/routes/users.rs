/// User management endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /v1/orgs/:org_id/users` - List organization users
/// - `POST   /v1/orgs/:org_id/users` - Create a user
/// - `PUT    /v1/orgs/:org_id/users/:user_id/role` - Change a user's role
/// - `DELETE /v1/orgs/:org_id/users/:user_id` - Remove a user

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::{
    access::guard::can_change_role,
    access::permissions::Action,
    audit,
    auth::{middleware::Identity, password},
    models::user::{CreateUser, Role, User},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{check_org_access, client_ip, Pagination},
    response::{ApiResponse, Meta},
};

/// Create-user request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Option<Role>,
}

/// Role-change request body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// List users of the organization, password hashes excluded
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    check_org_access(&identity, Action::UserManage, org_id)?;

    let (page, limit, offset) = pagination.resolve();

    let users = User::list_by_org(&state.db, org_id, limit, offset).await?;
    let total = User::count_by_org(&state.db, org_id).await?;

    Ok(Json(ApiResponse::ok_with_meta(
        users,
        Meta::paginated(page, limit, total),
    )))
}

/// Create a user in the organization
pub async fn create_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    check_org_access(&identity, Action::UserManage, org_id)?;

    req.validate().map_err(|e| {
        ApiError::ValidationError(
            e.field_errors()
                .iter()
                .flat_map(|(_, errors)| {
                    errors.iter().map(|error| {
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string())
                    })
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    password::validate_password_strength(&req.password).map_err(ApiError::ValidationError)?;
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            org_id,
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role.unwrap_or(Role::Member),
        },
    )
    .await?;

    audit::record(
        &state.db,
        &identity,
        "create",
        "user",
        Some(user.id),
        audit::change_set(None, Some(json!({ "email": user.email, "role": user.role }))),
        client_ip(&headers),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

/// Change a user's role
///
/// Admins cannot change their own role; this keeps at least one admin in
/// the organization.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    check_org_access(&identity, Action::UserManage, org_id)?;

    if !can_change_role(&identity, user_id) {
        return Err(ApiError::Forbidden(
            "You cannot change your own role".to_string(),
        ));
    }

    let before = User::find_by_id_and_org(&state.db, user_id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let user = User::update_role(&state.db, user_id, org_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    audit::record(
        &state.db,
        &identity,
        "update",
        "user",
        Some(user.id),
        audit::change_set(
            Some(json!({ "role": before.role })),
            Some(json!({ "role": user.role })),
        ),
        client_ip(&headers),
    )
    .await;

    Ok(Json(ApiResponse::ok(user)))
}

/// Remove a user from the organization
///
/// Self-deletion is rejected for the same reason self-demotion is.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    check_org_access(&identity, Action::UserManage, org_id)?;

    if user_id == identity.id {
        return Err(ApiError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    let user = User::find_by_id_and_org(&state.db, user_id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !User::delete(&state.db, user_id, org_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    audit::record(
        &state.db,
        &identity,
        "delete",
        "user",
        Some(user_id),
        audit::change_set(Some(json!({ "email": user.email, "role": user.role })), None),
        client_ip(&headers),
    )
    .await;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}
