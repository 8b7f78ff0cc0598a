/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register, creating or joining an organization
/// - `POST /v1/auth/login` - Login and get a token
/// - `GET  /v1/auth/me` - Current user

use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use taskdeck_shared::{
    audit,
    auth::{jwt, middleware::Identity, password},
    models::{
        organization::{slugify, CreateOrganization, Organization},
        user::{CreateUser, Role, User},
    },
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::client_ip,
    response::ApiResponse,
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Organization name (used when the org must be created)
    #[validate(length(min = 1, max = 200, message = "Organization name must be 1-200 characters"))]
    pub org_name: String,

    /// Organization slug; derived from the name when omitted
    pub org_slug: Option<String>,

    /// Requested role; ignored for the first user of an organization,
    /// who always becomes admin
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,

    /// Organization slug, disambiguating users registered in several orgs
    pub org_slug: Option<String>,
}

/// Token + user payload returned by register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

fn validation_message(e: &validator::ValidationErrors) -> String {
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
        .join("; ")
}

/// Register a new user
///
/// The organization is looked up by slug and created when absent. The
/// first user of an organization becomes admin regardless of the
/// requested role.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already taken in the organization
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(validation_message(&e)))?;

    password::validate_password_strength(&req.password).map_err(ApiError::ValidationError)?;

    let password_hash = password::hash_password(&req.password)?;

    let slug = req
        .org_slug
        .clone()
        .unwrap_or_else(|| slugify(&req.org_name));

    let org = match Organization::find_by_slug(&state.db, &slug).await? {
        Some(org) => org,
        None => {
            Organization::create(
                &state.db,
                CreateOrganization {
                    name: req.org_name.clone(),
                    slug,
                },
            )
            .await?
        }
    };

    // First user of an org is always its admin.
    let role = if User::count_by_org(&state.db, org.id).await? == 0 {
        Role::Admin
    } else {
        req.role.unwrap_or(Role::Member)
    };

    let user = User::create(
        &state.db,
        CreateUser {
            org_id: org.id,
            name: req.name,
            email: req.email,
            password_hash,
            role,
        },
    )
    .await?;

    let claims = jwt::Claims::new(user.id, org.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let identity = Identity::from(&user);
    audit::record(
        &state.db,
        &identity,
        "user.register",
        "user",
        Some(user.id),
        audit::change_set(None, Some(json!({ "email": user.email, "role": user.role }))),
        client_ip(&headers),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthPayload { token, user })),
    ))
}

/// Login
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid email or password
/// - `404 Not Found`: Unknown organization slug
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthPayload>>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(validation_message(&e)))?;

    let org_id = match &req.org_slug {
        Some(slug) => {
            let org = Organization::find_by_slug(&state.db, slug)
                .await?
                .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;
            Some(org.id)
        }
        None => None,
    };

    let user = User::find_by_email(&state.db, &req.email, org_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = jwt::Claims::new(user.id, user.org_id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let identity = Identity::from(&user);
    audit::record(
        &state.db,
        &identity,
        "user.login",
        "user",
        Some(user.id),
        json!({}),
        client_ip(&headers),
    )
    .await;

    Ok(Json(ApiResponse::ok(AuthPayload { token, user })))
}

/// Current user
///
/// Returns the freshly-resolved user for the bearer token; the password
/// hash is never serialized.
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(user)))
}
