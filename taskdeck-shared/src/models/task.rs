/// Task model and database operations
///
/// Tasks are the core entity of TaskDeck. Every mutation goes through the
/// task mutation service (`crate::mutation`), which diffs prior state for
/// activity and audit records; the methods here are the raw, org-scoped
/// persistence layer.
///
/// # Status lifecycle
///
/// ```text
/// todo → in-progress → review → done
/// ```
///
/// Transitions are unconstrained, but `completed_at` is stamped exactly when
/// status enters `done` and cleared on any transition out of it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     due_date TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
///     recurring_frequency recurring_frequency,
///     next_recurring_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// Converts priority to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

/// Recurrence interval for recurring tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurring_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RecurringFrequency {
    /// Converts the frequency to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringFrequency::Daily => "daily",
            RecurringFrequency::Weekly => "weekly",
            RecurringFrequency::Monthly => "monthly",
        }
    }

    /// Computes the next occurrence after `from`
    ///
    /// Monthly recurrence clamps to the last day of shorter months
    /// (Jan 31 → Feb 28).
    pub fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecurringFrequency::Daily => from + chrono::Duration::days(1),
            RecurringFrequency::Weekly => from + chrono::Duration::weeks(1),
            RecurringFrequency::Monthly => from
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(from + chrono::Duration::days(30)),
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Organization this task belongs to
    pub org_id: Uuid,

    /// Short title (non-empty, at most 200 characters)
    pub title: String,

    /// Long-form description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Assigned user (must belong to the same org)
    pub assignee_id: Option<Uuid>,

    /// User who created the task
    pub created_by: Uuid,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Due date, if any
    pub due_date: Option<DateTime<Utc>>,

    /// Set exactly when status transitions into done, cleared otherwise
    pub completed_at: Option<DateTime<Utc>>,

    /// Whether this task spawns copies on a schedule
    pub is_recurring: bool,

    /// Recurrence interval (set when is_recurring)
    pub recurring_frequency: Option<RecurringFrequency>,

    /// Next time the scheduler should clone this task
    pub next_recurring_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub org_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub next_recurring_date: Option<DateTime<Utc>>,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Filters for listing tasks within an organization
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    /// Case-insensitive substring match over title and description
    pub search: Option<String>,
    /// Restrict to tasks this user created or is assigned (member scope)
    pub owner_scope: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, org_id, title, description, status, priority, assignee_id, \
     created_by, tags, due_date, completed_at, is_recurring, recurring_frequency, \
     next_recurring_date, created_at, updated_at";

impl Task {
    /// Inserts a new task
    pub async fn insert(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (org_id, title, description, status, priority, assignee_id,
                               created_by, tags, due_date, is_recurring, recurring_frequency,
                               next_recurring_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.unwrap_or_default())
        .bind(data.priority.unwrap_or_default())
        .bind(data.assignee_id)
        .bind(data.created_by)
        .bind(data.tags)
        .bind(data.due_date)
        .bind(data.is_recurring)
        .bind(data.recurring_frequency)
        .bind(data.next_recurring_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID with org isolation
    ///
    /// Cross-org lookups return `None`, which the API reports as NotFound so
    /// existence is never confirmed across tenants.
    pub async fn find_by_id_and_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND org_id = $2"
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks of an organization with filters and pagination, newest first
    pub async fn list_by_org(
        pool: &PgPool,
        org_id: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE org_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
              AND ($4::uuid IS NULL OR assignee_id = $4)
              AND ($5::text IS NULL OR title ILIKE $5 OR description ILIKE $5)
              AND ($6::uuid IS NULL OR created_by = $6 OR assignee_id = $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(org_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assignee_id)
        .bind(pattern)
        .bind(filter.owner_scope)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts tasks of an organization matching the filter
    pub async fn count_by_org(
        pool: &PgPool,
        org_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE org_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
              AND ($4::uuid IS NULL OR assignee_id = $4)
              AND ($5::text IS NULL OR title ILIKE $5 OR description ILIKE $5)
              AND ($6::uuid IS NULL OR created_by = $6 OR assignee_id = $6)
            "#,
        )
        .bind(org_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assignee_id)
        .bind(pattern)
        .bind(filter.owner_scope)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies an already-planned update to a task row
    ///
    /// Callers go through `crate::mutation`, which computes the patched
    /// values (including the completed_at stamp/clear) before persisting.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_update(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        title: &str,
        description: &str,
        status: TaskStatus,
        priority: TaskPriority,
        assignee_id: Option<Uuid>,
        tags: &[String],
        due_date: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, status = $5, priority = $6,
                assignee_id = $7, tags = $8, due_date = $9, completed_at = $10,
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(org_id)
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(priority)
        .bind(assignee_id)
        .bind(tags)
        .bind(due_date)
        .bind(completed_at)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates only the assignee column
    pub async fn set_assignee(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assignee_id = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(org_id)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Hard-deletes a task, scoped to its organization
    ///
    /// Related activity rows are removed by CASCADE. No tombstone is kept;
    /// the audit log is the only remaining trace.
    pub async fn delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(org_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists recurring tasks whose next occurrence is due
    ///
    /// Used only by the scheduler; deliberately not org-scoped since the
    /// scheduler serves all tenants.
    pub async fn list_due_recurring(
        pool: &PgPool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE is_recurring = TRUE AND next_recurring_date <= $1
            ORDER BY next_recurring_date ASC
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Advances a recurring task's next occurrence
    pub async fn set_next_recurring_date(
        pool: &PgPool,
        id: Uuid,
        next: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET next_recurring_date = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(TaskStatus::Review.as_str(), "review");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Low.as_str(), "low");
        assert_eq!(TaskPriority::Critical.as_str(), "critical");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_recurrence_advance() {
        use chrono::TimeZone;

        let from = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(
            RecurringFrequency::Daily.advance(from),
            Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap()
        );
        assert_eq!(
            RecurringFrequency::Weekly.advance(from),
            Utc.with_ymd_and_hms(2025, 1, 22, 9, 0, 0).unwrap()
        );
        assert_eq!(
            RecurringFrequency::Monthly.advance(from),
            Utc.with_ymd_and_hms(2025, 2, 15, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_monthly_advance_clamps_to_month_end() {
        use chrono::TimeZone;

        let jan_31 = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            RecurringFrequency::Monthly.advance(jan_31),
            Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap()
        );
    }
}
