/// Authentication middleware for Axum
///
/// Extracts the bearer token from the `Authorization` header, validates it,
/// and resolves the acting user from the database. On success an
/// [`Identity`] is inserted into request extensions for handlers to extract
/// with `Extension<Identity>`.
///
/// The database lookup means a token referencing a deleted user fails with
/// 401 and a role change takes effect on the user's next request. The
/// password hash is never copied into the identity.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get};
/// use taskdeck_shared::auth::middleware::Identity;
///
/// async fn whoami(Extension(identity): Extension<Identity>) -> String {
///     format!("{} ({})", identity.name, identity.role.as_str())
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::{Role, User};

/// The acting identity, resolved once per request
///
/// This is what the access guard and handlers see; it carries everything
/// needed for permission, org-scope, and ownership checks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Authenticated user ID
    pub id: Uuid,

    /// The user's organization
    pub org_id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Role within the organization
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            org_id: user.org_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing or non-Bearer authorization header
    MissingCredentials,

    /// Token validation failed (bad signature, expired, malformed)
    InvalidToken(String),

    /// Token is valid but references a user that no longer exists
    UnknownUser,

    /// Database error during user resolution
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "No token provided".to_string()),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "User not found".to_string()),
            AuthError::DatabaseError(msg) => {
                tracing::error!("Auth middleware database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({ "success": false, "data": null, "error": message })),
        )
            .into_response()
    }
}

/// Bearer-token authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized when the header is absent, the token is not a
/// Bearer token, validation fails, the token has expired, or the referenced
/// user no longer exists.
pub async fn bearer_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    // Resolve the user fresh so deleted users and role changes are honored.
    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    let identity = Identity::from(&user);
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Manager,
            notify_email: true,
            notify_in_app: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_identity_from_user_drops_password_hash() {
        let user = sample_user();
        let identity = Identity::from(&user);

        assert_eq!(identity.id, user.id);
        assert_eq!(identity.org_id, user.org_id);
        assert_eq!(identity.role, Role::Manager);

        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("bad".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::UnknownUser.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DatabaseError("oops".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
