/// Best-effort audit recording
///
/// Audit writes must never fail the request that triggered them: a failed
/// insert is logged at error level and otherwise swallowed. The entry is
/// written after the mutation commits, so the log records what actually
/// happened.

use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::Identity;
use crate::models::audit_log::{AuditLog, NewAuditLog};

/// Builds the conventional `{"before": ..., "after": ...}` change payload
pub fn change_set(before: Option<JsonValue>, after: Option<JsonValue>) -> JsonValue {
    json!({
        "before": before.unwrap_or(JsonValue::Null),
        "after": after.unwrap_or(JsonValue::Null),
    })
}

/// Records an audit entry, swallowing any failure
///
/// Call after the mutation has committed. On insert failure the error is
/// logged with the action and resource for traceability and the caller
/// proceeds normally.
pub async fn record(
    pool: &PgPool,
    identity: &Identity,
    action: &str,
    resource: &str,
    resource_id: Option<Uuid>,
    changes: JsonValue,
    ip_address: Option<String>,
) {
    let entry = NewAuditLog {
        org_id: identity.org_id,
        user_id: identity.id,
        action: action.to_string(),
        resource: resource.to_string(),
        resource_id,
        changes,
        ip_address,
    };

    if let Err(e) = AuditLog::insert(pool, entry).await {
        tracing::error!(
            action,
            resource,
            "Failed to record audit entry: {}",
            e
        );
    }
}
