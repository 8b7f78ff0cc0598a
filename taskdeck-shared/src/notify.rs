/// In-app notification fan-out
///
/// Notifications are side effects of task mutations and share two rules:
///
/// - **Self-suppression**: a user never gets notified about their own
///   action, even if they assigned a task to themselves or mentioned
///   their own address.
/// - **Best-effort**: delivery failure is logged and swallowed; the
///   mutation that triggered it has already committed and stays committed.
///
/// Notification preferences do not gate record creation; they only
/// configure delivery channels read elsewhere.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::Identity;
use crate::models::notification::{NewNotification, Notification, NotificationType};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;

/// Decides whether a notification should be delivered at all
///
/// Pure self-suppression check: the actor never notifies themselves.
pub fn should_notify(actor_id: Uuid, recipient: &User) -> bool {
    recipient.id != actor_id
}

/// Notifies a user they were assigned a task
pub async fn task_assigned(pool: &PgPool, actor: &Identity, task: &Task, assignee: &User) {
    if !should_notify(actor.id, assignee) {
        return;
    }

    deliver(
        pool,
        NewNotification {
            org_id: task.org_id,
            recipient_id: assignee.id,
            notification_type: NotificationType::TaskAssigned,
            title: "Task assigned to you".to_string(),
            message: format!("{} assigned you \"{}\"", actor.name, task.title),
            task_id: Some(task.id),
            triggered_by: actor.id,
        },
    )
    .await;
}

/// Notifies a task's creator that its status changed
pub async fn task_status_changed(
    pool: &PgPool,
    actor: &Identity,
    task: &Task,
    creator: &User,
    old_status: TaskStatus,
    new_status: TaskStatus,
) {
    if !should_notify(actor.id, creator) {
        return;
    }

    deliver(
        pool,
        NewNotification {
            org_id: task.org_id,
            recipient_id: creator.id,
            notification_type: NotificationType::TaskStatusChanged,
            title: "Task status changed".to_string(),
            message: format!(
                "{} moved \"{}\" from {} to {}",
                actor.name,
                task.title,
                old_status.as_str(),
                new_status.as_str()
            ),
            task_id: Some(task.id),
            triggered_by: actor.id,
        },
    )
    .await;
}

/// Notifies every mentioned user in a comment
///
/// `mentioned` is already resolved to users in the actor's organization;
/// addresses that matched no one were dropped upstream.
pub async fn task_mentioned(pool: &PgPool, actor: &Identity, task: &Task, mentioned: &[User]) {
    for user in mentioned {
        if !should_notify(actor.id, user) {
            continue;
        }

        deliver(
            pool,
            NewNotification {
                org_id: task.org_id,
                recipient_id: user.id,
                notification_type: NotificationType::TaskMentioned,
                title: "You were mentioned".to_string(),
                message: format!("{} mentioned you on \"{}\"", actor.name, task.title),
                task_id: Some(task.id),
                triggered_by: actor.id,
            },
        )
        .await;
    }
}

/// Inserts one notification, logging and swallowing any failure
async fn deliver(pool: &PgPool, data: NewNotification) {
    let recipient_id = data.recipient_id;

    if let Err(e) = Notification::insert(pool, data).await {
        tracing::error!(
            recipient_id = %recipient_id,
            "Failed to deliver notification: {}",
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;

    fn user(notify_in_app: bool) -> User {
        User {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Recipient".to_string(),
            email: "recipient@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Member,
            notify_email: true,
            notify_in_app,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_actor_never_notifies_self() {
        let recipient = user(true);
        assert!(!should_notify(recipient.id, &recipient));
    }

    #[test]
    fn test_other_user_is_notified() {
        let recipient = user(true);
        assert!(should_notify(Uuid::new_v4(), &recipient));
    }

    #[test]
    fn test_prefs_do_not_gate_record_creation() {
        let recipient = user(false);
        assert!(should_notify(Uuid::new_v4(), &recipient));
    }
}
