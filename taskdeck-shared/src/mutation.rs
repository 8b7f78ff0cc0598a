/// Task mutation service
///
/// Every write to a task funnels through here so that validation, ownership
/// checks, activity records, notifications, and audit entries happen the
/// same way regardless of which endpoint triggered the write.
///
/// Each operation follows the same shape:
///
/// 1. Load the task org-scoped (cross-org lookups surface as `NotFound`).
/// 2. Check ownership via the access guard (`Forbidden`).
/// 3. Validate input (`Validation` / `InvalidAssignee`).
/// 4. Persist the change.
/// 5. Record activity, fan out notifications, and append the audit entry.
///
/// Steps 1-4 are fallible and abort the operation; step 5 is best-effort
/// and never unwinds a committed change.
///
/// When a single update changes both status and assignee, the
/// status-change activity is recorded before the assignment activity.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::guard::{can_delete_task, can_read_task, can_update_task};
use crate::access::permissions::{has_permission, Action};
use crate::audit;
use crate::auth::middleware::Identity;
use crate::mentions::extract_mention_emails;
use crate::models::activity::{NewActivity, TaskActivity};
use crate::models::task::{
    NewTask, RecurringFrequency, Task, TaskPriority, TaskStatus,
};
use crate::models::template::TaskTemplate;
use crate::models::user::User;
use crate::notify;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Error type for task mutations
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Input failed validation
    #[error("{0}")]
    Validation(String),

    /// Assignee does not exist in the actor's organization
    #[error("Assignee not found in this organization")]
    InvalidAssignee,

    /// Task does not exist in the actor's organization
    #[error("Task not found")]
    NotFound,

    /// Actor lacks permission for this task
    #[error("You do not have permission to modify this task")]
    Forbidden,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
}

/// Partial update to a task
///
/// `None` means "leave unchanged". For the nullable columns the inner
/// option distinguishes "set to this value" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// The fully-resolved result of applying a patch to a task
///
/// Computed before touching the database so the diff (and the
/// `completed_at` stamp) can be unit-tested in isolation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// (old, new), present only when status actually changed
    pub status_change: Option<(TaskStatus, TaskStatus)>,

    /// (from, to), present only when the assignee actually changed
    pub assignee_change: Option<(Option<Uuid>, Option<Uuid>)>,
}

/// Resolves a patch against the task's current state
///
/// `completed_at` is stamped with `now` exactly when status enters `done`
/// and cleared on any transition out of it; re-saving a done task keeps
/// the original timestamp.
pub fn plan_update(task: &Task, patch: &TaskPatch, now: DateTime<Utc>) -> UpdatePlan {
    let status = patch.status.unwrap_or(task.status);
    let assignee_id = patch.assignee_id.unwrap_or(task.assignee_id);

    let completed_at = match (task.status, status) {
        (TaskStatus::Done, TaskStatus::Done) => task.completed_at,
        (_, TaskStatus::Done) => Some(now),
        (TaskStatus::Done, _) => None,
        _ => task.completed_at,
    };

    let status_change = (status != task.status).then_some((task.status, status));
    let assignee_change =
        (assignee_id != task.assignee_id).then_some((task.assignee_id, assignee_id));

    UpdatePlan {
        title: patch.title.clone().unwrap_or_else(|| task.title.clone()),
        description: patch
            .description
            .clone()
            .unwrap_or_else(|| task.description.clone()),
        status,
        priority: patch.priority.unwrap_or(task.priority),
        assignee_id,
        tags: patch.tags.clone().unwrap_or_else(|| task.tags.clone()),
        due_date: patch.due_date.unwrap_or(task.due_date),
        completed_at,
        status_change,
        assignee_change,
    }
}

fn validate_title(title: &str) -> Result<(), MutationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(MutationError::Validation(
            "Title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(MutationError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Resolves an assignee id to a user of the actor's organization
async fn resolve_assignee(
    pool: &PgPool,
    org_id: Uuid,
    assignee_id: Uuid,
) -> Result<User, MutationError> {
    User::find_by_id_and_org(pool, assignee_id, org_id)
        .await?
        .ok_or(MutationError::InvalidAssignee)
}

fn task_snapshot(task: &Task) -> serde_json::Value {
    json!({
        "title": task.title,
        "status": task.status.as_str(),
        "priority": task.priority.as_str(),
        "assigneeId": task.assignee_id,
        "dueDate": task.due_date,
        "tags": task.tags,
    })
}

/// Creates a task in the actor's organization
///
/// Setting an assignee at creation requires the task.assign capability;
/// the assignee must belong to the same organization and is notified
/// (unless it is the actor). Recurring tasks require a frequency and get
/// their first occurrence scheduled from the due date (or from now when
/// no due date is set).
pub async fn create_task(
    pool: &PgPool,
    actor: &Identity,
    input: CreateTaskInput,
    ip_address: Option<String>,
) -> Result<Task, MutationError> {
    validate_title(&input.title)?;

    if input.is_recurring && input.recurring_frequency.is_none() {
        return Err(MutationError::Validation(
            "Recurring tasks require a frequency".to_string(),
        ));
    }

    if input.assignee_id.is_some() && !has_permission(actor.role, Action::TaskAssign) {
        return Err(MutationError::Forbidden);
    }

    let assignee = match input.assignee_id {
        Some(id) => Some(resolve_assignee(pool, actor.org_id, id).await?),
        None => None,
    };

    let next_recurring_date = input.recurring_frequency.filter(|_| input.is_recurring).map(
        |freq| freq.advance(input.due_date.unwrap_or_else(Utc::now)),
    );

    let task = Task::insert(
        pool,
        NewTask {
            org_id: actor.org_id,
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            assignee_id: input.assignee_id,
            created_by: actor.id,
            tags: input.tags,
            due_date: input.due_date,
            is_recurring: input.is_recurring,
            recurring_frequency: input.recurring_frequency,
            next_recurring_date,
        },
    )
    .await?;

    if let Some(assignee) = &assignee {
        let activity = NewActivity::assignment_changed(
            actor.org_id,
            task.id,
            actor.id,
            None,
            Some(assignee.id),
        );
        if let Err(e) = TaskActivity::insert(pool, activity).await {
            tracing::error!(task_id = %task.id, "Failed to record assignment activity: {}", e);
        }

        notify::task_assigned(pool, actor, &task, assignee).await;
    }

    audit::record(
        pool,
        actor,
        "create",
        "task",
        Some(task.id),
        audit::change_set(None, Some(task_snapshot(&task))),
        ip_address,
    )
    .await;

    Ok(task)
}

/// Spawns a fresh task from a template of the actor's organization
///
/// The new task starts in `todo` with the template's title, description,
/// priority, and default assignee, created by the actor. The template's
/// assignee applies regardless of the actor's assign capability: it was
/// fixed by whoever authored the template. Cross-org templates surface
/// as `NotFound`.
pub async fn create_task_from_template(
    pool: &PgPool,
    actor: &Identity,
    template_id: Uuid,
    ip_address: Option<String>,
) -> Result<Task, MutationError> {
    let template = TaskTemplate::find_by_id_and_org(pool, template_id, actor.org_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    let assignee = match template.assignee_id {
        Some(id) => Some(resolve_assignee(pool, actor.org_id, id).await?),
        None => None,
    };

    let task = Task::insert(
        pool,
        NewTask {
            org_id: actor.org_id,
            title: template.title.clone(),
            description: template.description.clone(),
            priority: Some(template.priority),
            assignee_id: template.assignee_id,
            created_by: actor.id,
            ..Default::default()
        },
    )
    .await?;

    if let Some(assignee) = &assignee {
        let activity = NewActivity::assignment_changed(
            actor.org_id,
            task.id,
            actor.id,
            None,
            Some(assignee.id),
        );
        if let Err(e) = TaskActivity::insert(pool, activity).await {
            tracing::error!(task_id = %task.id, "Failed to record assignment activity: {}", e);
        }

        notify::task_assigned(pool, actor, &task, assignee).await;
    }

    audit::record(
        pool,
        actor,
        "create_from_template",
        "task",
        Some(task.id),
        audit::change_set(None, Some(json!({ "templateId": template.id }))),
        ip_address,
    )
    .await;

    Ok(task)
}

/// Applies a partial update to a task
///
/// Records one activity per discrete change (status first, then
/// assignment) and notifies the task creator on status change and the new
/// assignee on reassignment.
pub async fn update_task(
    pool: &PgPool,
    actor: &Identity,
    task_id: Uuid,
    patch: TaskPatch,
    ip_address: Option<String>,
) -> Result<Task, MutationError> {
    let task = Task::find_by_id_and_org(pool, task_id, actor.org_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    if !can_update_task(actor, &task) {
        return Err(MutationError::Forbidden);
    }

    if let Some(title) = &patch.title {
        validate_title(title)?;
    }

    let new_assignee = match patch.assignee_id {
        Some(Some(id)) if Some(id) != task.assignee_id => {
            Some(resolve_assignee(pool, actor.org_id, id).await?)
        }
        _ => None,
    };

    let plan = plan_update(&task, &patch, Utc::now());

    let updated = Task::apply_update(
        pool,
        task.id,
        actor.org_id,
        plan.title.trim(),
        &plan.description,
        plan.status,
        plan.priority,
        plan.assignee_id,
        &plan.tags,
        plan.due_date,
        plan.completed_at,
    )
    .await?
    .ok_or(MutationError::NotFound)?;

    // Status activity is recorded before assignment so the feed reads in
    // the order the change was expressed.
    if let Some((old, new)) = plan.status_change {
        let activity =
            NewActivity::status_changed(actor.org_id, task.id, actor.id, old, new);
        if let Err(e) = TaskActivity::insert(pool, activity).await {
            tracing::error!(task_id = %task.id, "Failed to record status activity: {}", e);
        }

        if let Ok(Some(creator)) =
            User::find_by_id_and_org(pool, task.created_by, actor.org_id).await
        {
            notify::task_status_changed(pool, actor, &updated, &creator, old, new).await;
        }
    }

    if let Some((from, to)) = plan.assignee_change {
        let activity =
            NewActivity::assignment_changed(actor.org_id, task.id, actor.id, from, to);
        if let Err(e) = TaskActivity::insert(pool, activity).await {
            tracing::error!(task_id = %task.id, "Failed to record assignment activity: {}", e);
        }

        if let Some(assignee) = &new_assignee {
            notify::task_assigned(pool, actor, &updated, assignee).await;
        }
    }

    audit::record(
        pool,
        actor,
        "update",
        "task",
        Some(task.id),
        audit::change_set(Some(task_snapshot(&task)), Some(task_snapshot(&updated))),
        ip_address,
    )
    .await;

    Ok(updated)
}

/// Reassigns or unassigns a task
///
/// Setting the assignee it already has is a no-op: no activity, no
/// notification, no audit entry.
pub async fn assign_task(
    pool: &PgPool,
    actor: &Identity,
    task_id: Uuid,
    assignee_id: Option<Uuid>,
    ip_address: Option<String>,
) -> Result<Task, MutationError> {
    if !has_permission(actor.role, Action::TaskAssign) {
        return Err(MutationError::Forbidden);
    }

    let task = Task::find_by_id_and_org(pool, task_id, actor.org_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    if assignee_id == task.assignee_id {
        return Ok(task);
    }

    let assignee = match assignee_id {
        Some(id) => Some(resolve_assignee(pool, actor.org_id, id).await?),
        None => None,
    };

    let updated = Task::set_assignee(pool, task.id, actor.org_id, assignee_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    let activity = NewActivity::assignment_changed(
        actor.org_id,
        task.id,
        actor.id,
        task.assignee_id,
        assignee_id,
    );
    if let Err(e) = TaskActivity::insert(pool, activity).await {
        tracing::error!(task_id = %task.id, "Failed to record assignment activity: {}", e);
    }

    if let Some(assignee) = &assignee {
        notify::task_assigned(pool, actor, &updated, assignee).await;
    }

    audit::record(
        pool,
        actor,
        "assign",
        "task",
        Some(task.id),
        audit::change_set(
            Some(json!({ "assigneeId": task.assignee_id })),
            Some(json!({ "assigneeId": assignee_id })),
        ),
        ip_address,
    )
    .await;

    Ok(updated)
}

/// Deletes a task
///
/// Admins delete any task in their organization; managers and members
/// only tasks they created.
pub async fn delete_task(
    pool: &PgPool,
    actor: &Identity,
    task_id: Uuid,
    ip_address: Option<String>,
) -> Result<(), MutationError> {
    let task = Task::find_by_id_and_org(pool, task_id, actor.org_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    if !can_delete_task(actor, &task) {
        return Err(MutationError::Forbidden);
    }

    if !Task::delete(pool, task.id, actor.org_id).await? {
        return Err(MutationError::NotFound);
    }

    audit::record(
        pool,
        actor,
        "delete",
        "task",
        Some(task.id),
        audit::change_set(Some(task_snapshot(&task)), None),
        ip_address,
    )
    .await;

    Ok(())
}

/// Adds a comment to a task
///
/// @-mentions in the body are resolved against the actor's organization;
/// each resolved user (other than the actor) is notified. Addresses that
/// match no user are silently dropped.
pub async fn add_comment(
    pool: &PgPool,
    actor: &Identity,
    task_id: Uuid,
    body: String,
    ip_address: Option<String>,
) -> Result<TaskActivity, MutationError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(MutationError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(MutationError::Validation(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LENGTH
        )));
    }

    let task = Task::find_by_id_and_org(pool, task_id, actor.org_id)
        .await?
        .ok_or(MutationError::NotFound)?;

    if !can_read_task(actor, &task) {
        return Err(MutationError::Forbidden);
    }

    let emails = extract_mention_emails(trimmed);
    let mentioned = User::find_by_emails_in_org(pool, actor.org_id, &emails).await?;
    let mention_ids: Vec<Uuid> = mentioned.iter().map(|u| u.id).collect();

    let activity = TaskActivity::insert(
        pool,
        NewActivity::comment(
            actor.org_id,
            task.id,
            actor.id,
            trimmed.to_string(),
            mention_ids,
        ),
    )
    .await?;

    notify::task_mentioned(pool, actor, &task, &mentioned).await;

    audit::record(
        pool,
        actor,
        "create",
        "task_comment",
        Some(activity.id),
        audit::change_set(None, Some(json!({ "taskId": task.id }))),
        ip_address,
    )
    .await;

    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            title: "Write release notes".to_string(),
            description: "for 2.4".to_string(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: None,
            created_by: Uuid::new_v4(),
            tags: vec!["docs".to_string()],
            due_date: None,
            completed_at: None,
            is_recurring: false,
            recurring_frequency: None,
            next_recurring_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let task = base_task();
        let plan = plan_update(&task, &TaskPatch::default(), at(10));

        assert_eq!(plan.title, task.title);
        assert_eq!(plan.status, task.status);
        assert_eq!(plan.assignee_id, None);
        assert_eq!(plan.completed_at, None);
        assert!(plan.status_change.is_none());
        assert!(plan.assignee_change.is_none());
    }

    #[test]
    fn test_entering_done_stamps_completed_at() {
        let task = base_task();
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert_eq!(plan.completed_at, Some(at(10)));
        assert_eq!(plan.status_change, Some((TaskStatus::Todo, TaskStatus::Done)));
    }

    #[test]
    fn test_leaving_done_clears_completed_at() {
        let mut task = base_task();
        task.status = TaskStatus::Done;
        task.completed_at = Some(at(9));

        let patch = TaskPatch {
            status: Some(TaskStatus::Review),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert_eq!(plan.completed_at, None);
        assert_eq!(
            plan.status_change,
            Some((TaskStatus::Done, TaskStatus::Review))
        );
    }

    #[test]
    fn test_resaving_done_task_keeps_original_timestamp() {
        let mut task = base_task();
        task.status = TaskStatus::Done;
        task.completed_at = Some(at(9));

        let patch = TaskPatch {
            title: Some("Write release notes (final)".to_string()),
            status: Some(TaskStatus::Done),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(11));
        assert_eq!(plan.completed_at, Some(at(9)));
        assert!(plan.status_change.is_none());
    }

    #[test]
    fn test_assignee_clear_is_a_change() {
        let mut task = base_task();
        let assignee = Uuid::new_v4();
        task.assignee_id = Some(assignee);

        let patch = TaskPatch {
            assignee_id: Some(None),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert_eq!(plan.assignee_id, None);
        assert_eq!(plan.assignee_change, Some((Some(assignee), None)));
    }

    #[test]
    fn test_same_assignee_is_not_a_change() {
        let mut task = base_task();
        let assignee = Uuid::new_v4();
        task.assignee_id = Some(assignee);

        let patch = TaskPatch {
            assignee_id: Some(Some(assignee)),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert!(plan.assignee_change.is_none());
    }

    #[test]
    fn test_status_and_assignee_both_tracked() {
        let task = base_task();
        let assignee = Uuid::new_v4();

        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            assignee_id: Some(Some(assignee)),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert_eq!(
            plan.status_change,
            Some((TaskStatus::Todo, TaskStatus::InProgress))
        );
        assert_eq!(plan.assignee_change, Some((None, Some(assignee))));
        assert_eq!(plan.completed_at, None);
    }

    #[test]
    fn test_due_date_clear() {
        let mut task = base_task();
        task.due_date = Some(at(8));

        let patch = TaskPatch {
            due_date: Some(None),
            ..Default::default()
        };

        let plan = plan_update(&task, &patch, at(10));
        assert_eq!(plan.due_date, None);
    }

    #[test]
    fn test_title_validation() {
        assert!(validate_title("ok").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }
}
