/// Shared request-handling helpers
///
/// Pagination parsing, client IP extraction, and the org-path guard used
/// by every `/orgs/:org_id/...` handler.

use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use taskdeck_shared::access::guard::authorize;
use taskdeck_shared::access::permissions::Action;
use taskdeck_shared::auth::middleware::Identity;

use crate::error::{ApiError, ApiResult};

/// Default page size
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination query parameters (`?page=&limit=`)
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Returns (page, limit, offset) with page clamped to >= 1 and limit
    /// to 1..=MAX_LIMIT
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

/// Checks the path org against the identity and the required permission
///
/// Every org-scoped handler calls this first. An org-path mismatch is a
/// 403, not a 404: the route itself names the foreign org, so there is
/// no existence to hide.
pub fn check_org_access(
    identity: &Identity,
    action: Action,
    path_org_id: Uuid,
) -> ApiResult<()> {
    authorize(Some(identity), action, Some(path_org_id)).map_err(ApiError::from)
}

/// Extracts the client IP for audit records
///
/// Prefers `X-Forwarded-For` (first hop), falls back to `X-Real-IP`.
/// Absent headers yield `None`; audit entries tolerate a missing IP.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination {
            page: None,
            limit: None,
        };
        assert_eq!(p.resolve(), (1, DEFAULT_LIMIT, 0));
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(p.resolve(), (1, MAX_LIMIT, 0));

        let p = Pagination {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(p.resolve(), (3, 10, 20));
    }

    #[test]
    fn test_client_ip_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), Some("198.51.100.2".to_string()));
    }

    #[test]
    fn test_client_ip_absent() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
