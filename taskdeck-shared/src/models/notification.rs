/// Notification model and database operations
///
/// In-app notification records created by the notifier (`crate::notify`).
/// A notification is never created when the recipient is the user who
/// triggered the event; that rule lives in the notifier, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Recipient was assigned to a task
    TaskAssigned,

    /// A task the recipient created changed status
    TaskStatusChanged,

    /// Recipient was mentioned in a comment
    TaskMentioned,
}

/// Notification record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Organization scope
    pub org_id: Uuid,

    /// User this notification is for
    pub recipient_id: Uuid,

    /// Kind of notification
    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    /// Short title
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Related task, if any
    pub task_id: Option<Uuid>,

    /// User whose action triggered this notification
    pub triggered_by: Option<Uuid>,

    /// Whether the recipient has read it
    pub read: bool,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub org_id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub task_id: Option<Uuid>,
    pub triggered_by: Uuid,
}

const NOTIFICATION_COLUMNS: &str = "id, org_id, recipient_id, notification_type, title, \
     message, task_id, triggered_by, read, created_at";

impl Notification {
    /// Inserts a notification record
    pub async fn insert(pool: &PgPool, data: NewNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (org_id, recipient_id, notification_type, title, message,
                                       task_id, triggered_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.recipient_id)
        .bind(data.notification_type)
        .bind(data.title)
        .bind(data.message)
        .bind(data.task_id)
        .bind(data.triggered_by)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Lists a user's notifications with pagination, newest first
    pub async fn list_by_recipient(
        pool: &PgPool,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Counts all notifications for a user
    pub async fn count_by_recipient(pool: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
                .bind(recipient_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Counts unread notifications for a user
    pub async fn count_unread(pool: &PgPool, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks one notification as read, scoped to its recipient
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Marks all of a user's notifications as read
    pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND read = FALSE")
                .bind(recipient_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&NotificationType::TaskAssigned).unwrap(),
            "\"task_assigned\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationType::TaskStatusChanged).unwrap(),
            "\"task_status_changed\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationType::TaskMentioned).unwrap(),
            "\"task_mentioned\""
        );
    }
}
