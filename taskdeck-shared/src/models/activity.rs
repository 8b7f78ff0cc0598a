/// Task activity model and database operations
///
/// Append-only log of task-level events: comments, status changes, and
/// assignment changes. One row per discrete event, ordered by creation time.
/// Rows are never updated or deleted by the application (task deletion
/// cascades at the database level).
///
/// The type-specific payload lives in flat nullable columns:
///
/// - `comment`: comment_body + mentions
/// - `status_changed`: old_status + new_status
/// - `assigned` / `unassigned`: from_assignee_id + to_assignee_id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskStatus;

/// Kind of task event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// A comment, possibly mentioning other users
    Comment,

    /// Workflow status changed
    StatusChanged,

    /// Task gained an assignee (to_assignee_id set)
    Assigned,

    /// Task lost its assignee (to_assignee_id null)
    Unassigned,
}

impl ActivityType {
    /// Converts the type to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Comment => "comment",
            ActivityType::StatusChanged => "status_changed",
            ActivityType::Assigned => "assigned",
            ActivityType::Unassigned => "unassigned",
        }
    }
}

/// Task activity record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivity {
    /// Unique activity ID
    pub id: Uuid,

    /// Organization the task belongs to
    pub org_id: Uuid,

    /// Task this event happened on
    pub task_id: Uuid,

    /// Kind of event
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// User who caused the event
    pub actor_id: Uuid,

    /// Comment body (comment events only)
    pub comment_body: Option<String>,

    /// Resolved mentioned user ids (comment events only)
    pub mentions: Vec<Uuid>,

    /// Status before the change (status_changed events only)
    pub old_status: Option<TaskStatus>,

    /// Status after the change (status_changed events only)
    pub new_status: Option<TaskStatus>,

    /// Assignee before the change (assignment events only)
    pub from_assignee_id: Option<Uuid>,

    /// Assignee after the change (assignment events only)
    pub to_assignee_id: Option<Uuid>,

    /// When the event happened
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an activity record
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub org_id: Uuid,
    pub task_id: Uuid,
    pub activity_type: ActivityType,
    pub actor_id: Uuid,
    pub comment_body: Option<String>,
    pub mentions: Vec<Uuid>,
    pub old_status: Option<TaskStatus>,
    pub new_status: Option<TaskStatus>,
    pub from_assignee_id: Option<Uuid>,
    pub to_assignee_id: Option<Uuid>,
}

impl NewActivity {
    /// A status-change event
    pub fn status_changed(
        org_id: Uuid,
        task_id: Uuid,
        actor_id: Uuid,
        old_status: TaskStatus,
        new_status: TaskStatus,
    ) -> Self {
        Self {
            org_id,
            task_id,
            activity_type: ActivityType::StatusChanged,
            actor_id,
            comment_body: None,
            mentions: Vec::new(),
            old_status: Some(old_status),
            new_status: Some(new_status),
            from_assignee_id: None,
            to_assignee_id: None,
        }
    }

    /// An assignment-change event; typed `assigned` when a new assignee is
    /// set, `unassigned` when the assignee is removed
    pub fn assignment_changed(
        org_id: Uuid,
        task_id: Uuid,
        actor_id: Uuid,
        from: Option<Uuid>,
        to: Option<Uuid>,
    ) -> Self {
        Self {
            org_id,
            task_id,
            activity_type: if to.is_some() {
                ActivityType::Assigned
            } else {
                ActivityType::Unassigned
            },
            actor_id,
            comment_body: None,
            mentions: Vec::new(),
            old_status: None,
            new_status: None,
            from_assignee_id: from,
            to_assignee_id: to,
        }
    }

    /// A comment event with resolved mention ids
    pub fn comment(
        org_id: Uuid,
        task_id: Uuid,
        actor_id: Uuid,
        body: String,
        mentions: Vec<Uuid>,
    ) -> Self {
        Self {
            org_id,
            task_id,
            activity_type: ActivityType::Comment,
            actor_id,
            comment_body: Some(body),
            mentions,
            old_status: None,
            new_status: None,
            from_assignee_id: None,
            to_assignee_id: None,
        }
    }
}

const ACTIVITY_COLUMNS: &str = "id, org_id, task_id, activity_type, actor_id, comment_body, \
     mentions, old_status, new_status, from_assignee_id, to_assignee_id, created_at";

impl TaskActivity {
    /// Appends one activity record
    pub async fn insert(pool: &PgPool, data: NewActivity) -> Result<Self, sqlx::Error> {
        let activity = sqlx::query_as::<_, TaskActivity>(&format!(
            r#"
            INSERT INTO task_activity (org_id, task_id, activity_type, actor_id, comment_body,
                                       mentions, old_status, new_status, from_assignee_id,
                                       to_assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.task_id)
        .bind(data.activity_type)
        .bind(data.actor_id)
        .bind(data.comment_body)
        .bind(data.mentions)
        .bind(data.old_status)
        .bind(data.new_status)
        .bind(data.from_assignee_id)
        .bind(data.to_assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(activity)
    }

    /// Lists activity for a task, newest first
    pub async fn list_by_task(
        pool: &PgPool,
        org_id: Uuid,
        task_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, TaskActivity>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS} FROM task_activity
            WHERE org_id = $1 AND task_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(org_id)
        .bind(task_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}
