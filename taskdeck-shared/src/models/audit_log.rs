/// Audit log model and database operations
///
/// Append-only, immutable record of every mutating action that reached a
/// handler. The application only ever inserts and reads; there is no update
/// or delete surface on this table.
///
/// The `changes` payload is a JSON object, conventionally
/// `{"before": {...}, "after": {...}}`. An empty object is permitted where
/// no prior state exists (e.g. login).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Audit log record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// Unique entry ID
    pub id: Uuid,

    /// Organization scope
    pub org_id: Uuid,

    /// Acting user
    pub user_id: Uuid,

    /// Action name (e.g. "create", "update", "user.login")
    pub action: String,

    /// Resource type (e.g. "task", "user", "task_comment")
    pub resource: String,

    /// Affected resource id, when one exists
    pub resource_id: Option<Uuid>,

    /// Before/after change payload
    pub changes: JsonValue,

    /// Client IP address as reported by the server
    pub ip_address: Option<String>,

    /// When the action happened
    pub timestamp: DateTime<Utc>,
}

/// Input for appending an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<Uuid>,
    pub changes: JsonValue,
    pub ip_address: Option<String>,
}

/// Filters for the audit-log query surface
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource: Option<String>,
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

const AUDIT_COLUMNS: &str =
    "id, org_id, user_id, action, resource, resource_id, changes, ip_address, timestamp";

impl AuditLog {
    /// Appends one audit entry
    pub async fn insert(pool: &PgPool, data: NewAuditLog) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs (org_id, user_id, action, resource, resource_id, changes,
                                    ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AUDIT_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.user_id)
        .bind(data.action)
        .bind(data.resource)
        .bind(data.resource_id)
        .bind(data.changes)
        .bind(data.ip_address)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists audit entries for an organization, newest first
    ///
    /// Supports filtering by action, resource, acting user, and a timestamp
    /// range; paginated via limit/offset.
    pub async fn list_by_org(
        pool: &PgPool,
        org_id: Uuid,
        filter: &AuditFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS} FROM audit_logs
            WHERE org_id = $1
              AND ($2::varchar IS NULL OR action = $2)
              AND ($3::varchar IS NULL OR resource = $3)
              AND ($4::uuid IS NULL OR user_id = $4)
              AND ($5::timestamptz IS NULL OR timestamp >= $5)
              AND ($6::timestamptz IS NULL OR timestamp <= $6)
            ORDER BY timestamp DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(org_id)
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Counts audit entries matching the filter
    pub async fn count_by_org(
        pool: &PgPool,
        org_id: Uuid,
        filter: &AuditFilter,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE org_id = $1
              AND ($2::varchar IS NULL OR action = $2)
              AND ($3::varchar IS NULL OR resource = $3)
              AND ($4::uuid IS NULL OR user_id = $4)
              AND ($5::timestamptz IS NULL OR timestamp >= $5)
              AND ($6::timestamptz IS NULL OR timestamp <= $6)
            "#,
        )
        .bind(org_id)
        .bind(filter.action.as_deref())
        .bind(filter.resource.as_deref())
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
