/// Dashboard statistics and CSV export
///
/// All queries are org-scoped. Dashboard queries take an optional scope
/// user: `None` aggregates the whole organization (admin/manager view),
/// `Some(id)` restricts to tasks assigned to the user (member view).

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::task::{TaskPriority, TaskStatus};

/// Tasks per workflow status
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

/// Tasks per priority
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

/// Tasks completed on one day
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompletedPoint {
    pub day: NaiveDate,
    pub count: i64,
}

/// Aggregated dashboard numbers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: i64,
    pub overdue: i64,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,

    /// Share of tasks in `done`, 0.0 when there are no tasks
    pub completion_rate: f64,
}

/// One row of the CSV export, user ids resolved to display names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExportRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_name: Option<String>,
    pub creator_name: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counts tasks per status
pub async fn status_counts(
    pool: &PgPool,
    org_id: Uuid,
    scope_user: Option<Uuid>,
) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*) AS count FROM tasks
        WHERE org_id = $1
          AND ($2::uuid IS NULL OR assignee_id = $2)
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(org_id)
    .bind(scope_user)
    .fetch_all(pool)
    .await
}

/// Counts tasks per priority
pub async fn priority_counts(
    pool: &PgPool,
    org_id: Uuid,
    scope_user: Option<Uuid>,
) -> Result<Vec<PriorityCount>, sqlx::Error> {
    sqlx::query_as::<_, PriorityCount>(
        r#"
        SELECT priority, COUNT(*) AS count FROM tasks
        WHERE org_id = $1
          AND ($2::uuid IS NULL OR assignee_id = $2)
        GROUP BY priority
        ORDER BY priority
        "#,
    )
    .bind(org_id)
    .bind(scope_user)
    .fetch_all(pool)
    .await
}

/// Counts overdue open tasks (past due date and not done)
pub async fn overdue_count(
    pool: &PgPool,
    org_id: Uuid,
    scope_user: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM tasks
        WHERE org_id = $1
          AND ($2::uuid IS NULL OR assignee_id = $2)
          AND due_date < NOW()
          AND status <> 'done'
        "#,
    )
    .bind(org_id)
    .bind(scope_user)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Counts all tasks in scope
pub async fn total_count(
    pool: &PgPool,
    org_id: Uuid,
    scope_user: Option<Uuid>,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM tasks
        WHERE org_id = $1
          AND ($2::uuid IS NULL OR assignee_id = $2)
        "#,
    )
    .bind(org_id)
    .bind(scope_user)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Gathers the full dashboard payload
pub async fn dashboard_stats(
    pool: &PgPool,
    org_id: Uuid,
    scope_user: Option<Uuid>,
) -> Result<DashboardStats, sqlx::Error> {
    let total = total_count(pool, org_id, scope_user).await?;
    let by_status = status_counts(pool, org_id, scope_user).await?;

    let done = by_status
        .iter()
        .find(|c| c.status == TaskStatus::Done)
        .map(|c| c.count)
        .unwrap_or(0);

    Ok(DashboardStats {
        total,
        overdue: overdue_count(pool, org_id, scope_user).await?,
        by_priority: priority_counts(pool, org_id, scope_user).await?,
        completion_rate: if total > 0 {
            done as f64 / total as f64
        } else {
            0.0
        },
        by_status,
    })
}

/// Tasks completed per day over the last `days` days
pub async fn completed_over_time(
    pool: &PgPool,
    org_id: Uuid,
    days: i32,
) -> Result<Vec<CompletedPoint>, sqlx::Error> {
    sqlx::query_as::<_, CompletedPoint>(
        r#"
        SELECT (completed_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
        FROM tasks
        WHERE org_id = $1
          AND completed_at IS NOT NULL
          AND completed_at >= NOW() - make_interval(days => $2)
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(org_id)
    .bind(days)
    .fetch_all(pool)
    .await
}

/// Fetches all tasks of an organization for export, newest first
pub async fn export_rows(pool: &PgPool, org_id: Uuid) -> Result<Vec<ExportRow>, sqlx::Error> {
    sqlx::query_as::<_, ExportRow>(
        r#"
        SELECT t.id, t.title, t.description, t.status, t.priority,
               a.name AS assignee_name, c.name AS creator_name,
               t.due_date, t.created_at, t.updated_at
        FROM tasks t
        LEFT JOIN users a ON a.id = t.assignee_id
        JOIN users c ON c.id = t.created_by
        WHERE t.org_id = $1
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await
}

/// Escapes one CSV field
///
/// Fields containing a comma, double quote, or newline are wrapped in
/// double quotes with internal quotes doubled (RFC 4180).
pub fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders export rows as a CSV document with a header line
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(
        "ID,Title,Description,Status,Priority,Assignee,Created By,Due Date,Created At,Updated At\n",
    );

    for row in rows {
        let fields = [
            row.id.to_string(),
            csv_escape(&row.title),
            csv_escape(&row.description),
            row.status.as_str().to_string(),
            row.priority.as_str().to_string(),
            csv_escape(row.assignee_name.as_deref().unwrap_or("")),
            csv_escape(&row.creator_name),
            row.due_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            row.created_at.to_rfc3339(),
            row.updated_at.to_rfc3339(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_csv_escape_plain_field_untouched() {
        assert_eq!(csv_escape("Ship it"), "Ship it");
    }

    #[test]
    fn test_csv_escape_quotes_are_doubled() {
        assert_eq!(csv_escape("Fix \"login\" bug"), "\"Fix \"\"login\"\" bug\"");
    }

    #[test]
    fn test_csv_escape_comma_and_newline() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_render_csv_header_and_rows() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let rows = vec![ExportRow {
            id: Uuid::nil(),
            title: "Fix \"login\" bug".to_string(),
            description: "crashes on submit".to_string(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            assignee_name: Some("Jane Doe".to_string()),
            creator_name: "Sam Lee".to_string(),
            due_date: None,
            created_at: created,
            updated_at: created,
        }];

        let csv = render_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Title,Description,Status,Priority,Assignee,Created By,Due Date,Created At,Updated At"
        );

        let row = lines.next().unwrap();
        assert!(row.starts_with("00000000-0000-0000-0000-000000000000,"));
        assert!(row.contains("\"Fix \"\"login\"\" bug\""));
        assert!(row.contains("in-progress,high,Jane Doe,Sam Lee,,"));
    }

    #[test]
    fn test_render_csv_empty_is_header_only() {
        let csv = render_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
    }
}
