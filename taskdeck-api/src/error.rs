/// Error handling for the API server
///
/// A unified error type mapping to HTTP responses in the standard
/// `{success, data, error}` envelope. Handlers return
/// `Result<T, ApiError>`; conversions from the shared crate's error
/// types keep the mapping in one place.
///
/// # Example
///
/// ```
/// use taskdeck_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     Err(ApiError::NotFound("Task not found".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use taskdeck_shared::access::guard::AccessError;
use taskdeck_shared::auth::jwt::JwtError;
use taskdeck_shared::auth::password::PasswordError;
use taskdeck_shared::mutation::MutationError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    ValidationError(String),

    /// Unauthenticated (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Resource absent or cross-org (404)
    NotFound(String),

    /// Duplicate resource (409)
    Conflict(String),

    /// Internal server error (500); the message is logged, not sent
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation failed: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
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

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict(
                            "A user with this email already exists in this organization"
                                .to_string(),
                        );
                    }
                    if constraint.contains("slug") {
                        return ApiError::Conflict(
                            "An organization with this slug already exists".to_string(),
                        );
                    }
                    if constraint.contains("task_templates") {
                        return ApiError::Conflict(
                            "A template with this name already exists in this organization"
                                .to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<MutationError> for ApiError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Validation(msg) => ApiError::ValidationError(msg),
            MutationError::InvalidAssignee => {
                ApiError::ValidationError("Assignee not found in this organization".to_string())
            }
            MutationError::NotFound => ApiError::NotFound("Task not found".to_string()),
            MutationError::Forbidden => ApiError::Forbidden(
                "You do not have permission to modify this task".to_string(),
            ),
            MutationError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AccessError::InsufficientPermission(action) => {
                ApiError::Forbidden(format!("Insufficient permissions: {} required", action))
            }
            AccessError::CrossOrgAccess => ApiError::Forbidden(
                "You do not have access to this organization".to_string(),
            ),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::Invalid(_) => ApiError::Unauthorized("Invalid token".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_shared::access::permissions::Action;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::ValidationError("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("who".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                ApiError::InternalError("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_access_error_mapping() {
        assert!(matches!(
            ApiError::from(AccessError::NotAuthenticated),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AccessError::InsufficientPermission(
                Action::AuditView.as_str()
            )),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(AccessError::CrossOrgAccess),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn test_mutation_error_mapping() {
        assert!(matches!(
            ApiError::from(MutationError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(MutationError::InvalidAssignee),
            ApiError::ValidationError(_)
        ));
        assert!(matches!(
            ApiError::from(MutationError::Forbidden),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn test_internal_error_does_not_leak() {
        use axum::response::IntoResponse;

        let response = ApiError::InternalError("secret connection string".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
