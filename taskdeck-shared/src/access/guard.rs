/// The per-request authorization gate
///
/// [`authorize`] combines three checks in a fixed order:
///
/// 1. An identity must be present (otherwise `NotAuthenticated`).
/// 2. The identity's role must be granted the action (otherwise
///    `InsufficientPermission`).
/// 3. When a target organization is given, it must match the identity's
///    organization (otherwise `CrossOrgAccess`).
///
/// The function is pure: same inputs, same decision, no side effects, so
/// callers may invoke it as many times per request as convenient.
///
/// Ownership narrowing for a concrete task lives in [`can_update_task`]
/// and [`can_delete_task`]; those assume `authorize` already passed for
/// the capability class.

use uuid::Uuid;

use super::permissions::{has_permission, Action};
use crate::auth::middleware::Identity;
use crate::models::task::Task;
use crate::models::user::Role;

/// Error type for authorization decisions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// No identity on the request
    #[error("Authentication required")]
    NotAuthenticated,

    /// Role lacks the required permission
    #[error("Insufficient permissions: {0} required")]
    InsufficientPermission(&'static str),

    /// Identity belongs to a different organization than the target
    #[error("Resource belongs to a different organization")]
    CrossOrgAccess,
}

/// Authorizes an action, optionally against a target organization
///
/// # Errors
///
/// - `AccessError::NotAuthenticated` when `identity` is `None`
/// - `AccessError::InsufficientPermission` when the role lacks the action
/// - `AccessError::CrossOrgAccess` when `target_org` is set and differs
///   from the identity's organization
pub fn authorize(
    identity: Option<&Identity>,
    action: Action,
    target_org: Option<Uuid>,
) -> Result<(), AccessError> {
    let identity = identity.ok_or(AccessError::NotAuthenticated)?;

    if !has_permission(identity.role, action) {
        return Err(AccessError::InsufficientPermission(action.as_str()));
    }

    if let Some(org_id) = target_org {
        if org_id != identity.org_id {
            return Err(AccessError::CrossOrgAccess);
        }
    }

    Ok(())
}

/// Whether the identity sees the whole organization when listing tasks
pub fn has_all_read_scope(identity: &Identity) -> bool {
    has_permission(identity.role, Action::TaskReadAll)
}

/// Whether the identity may read this task
///
/// Admins and managers read any task in their organization; members only
/// tasks they created or are assigned.
pub fn can_read_task(identity: &Identity, task: &Task) -> bool {
    if has_permission(identity.role, Action::TaskReadAll) {
        return true;
    }

    is_task_owner(identity, task)
}

/// Whether the identity may update this task
///
/// Admins and managers update any task; members only tasks they created
/// or are assigned.
pub fn can_update_task(identity: &Identity, task: &Task) -> bool {
    if has_permission(identity.role, Action::TaskUpdateAny) {
        return true;
    }

    is_task_owner(identity, task)
}

/// Whether the identity may delete this task
///
/// Admins delete any task; managers and members only tasks they created.
/// Being the assignee is not enough to delete.
pub fn can_delete_task(identity: &Identity, task: &Task) -> bool {
    if has_permission(identity.role, Action::TaskDeleteAny) {
        return true;
    }

    task.created_by == identity.id
}

/// Creator or current assignee
fn is_task_owner(identity: &Identity, task: &Task) -> bool {
    task.created_by == identity.id || task.assignee_id == Some(identity.id)
}

/// Whether the identity may change another user's role
///
/// Admin-only, and never against their own account (an organization must
/// keep at least one admin, and self-demotion is the easy way to lose it).
pub fn can_change_role(identity: &Identity, target_user_id: Uuid) -> bool {
    identity.role == Role::Admin && identity.id != target_user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::task::{TaskPriority, TaskStatus};

    fn identity(role: Role, org_id: Uuid) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            org_id,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role,
        }
    }

    fn task_in(org_id: Uuid, created_by: Uuid, assignee_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            org_id,
            title: "Sample".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            created_by,
            assignee_id,
            due_date: None,
            tags: vec![],
            completed_at: None,
            is_recurring: false,
            recurring_frequency: None,
            next_recurring_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_is_rejected_first() {
        let result = authorize(None, Action::TaskCreate, None);
        assert_eq!(result, Err(AccessError::NotAuthenticated));
    }

    #[test]
    fn test_permission_checked_before_org() {
        // A member hitting an admin action in another org gets the
        // permission error, not the cross-org error.
        let member = identity(Role::Member, Uuid::new_v4());
        let result = authorize(Some(&member), Action::AuditView, Some(Uuid::new_v4()));
        assert_eq!(
            result,
            Err(AccessError::InsufficientPermission("audit.view"))
        );
    }

    #[test]
    fn test_cross_org_rejected() {
        let admin = identity(Role::Admin, Uuid::new_v4());
        let result = authorize(Some(&admin), Action::TaskCreate, Some(Uuid::new_v4()));
        assert_eq!(result, Err(AccessError::CrossOrgAccess));
    }

    #[test]
    fn test_same_org_allowed() {
        let org = Uuid::new_v4();
        let manager = identity(Role::Manager, org);
        assert!(authorize(Some(&manager), Action::TaskAssign, Some(org)).is_ok());
    }

    #[test]
    fn test_authorize_is_idempotent() {
        let org = Uuid::new_v4();
        let member = identity(Role::Member, org);

        let first = authorize(Some(&member), Action::TaskCreate, Some(org));
        let second = authorize(Some(&member), Action::TaskCreate, Some(org));
        assert_eq!(first, second);
        assert!(first.is_ok());
    }

    #[test]
    fn test_member_update_own_only() {
        let org = Uuid::new_v4();
        let member = identity(Role::Member, org);

        let created = task_in(org, member.id, None);
        let assigned = task_in(org, Uuid::new_v4(), Some(member.id));
        let unrelated = task_in(org, Uuid::new_v4(), Some(Uuid::new_v4()));

        assert!(can_update_task(&member, &created));
        assert!(can_update_task(&member, &assigned));
        assert!(!can_update_task(&member, &unrelated));

        assert!(can_read_task(&member, &created));
        assert!(can_read_task(&member, &assigned));
        assert!(!can_read_task(&member, &unrelated));
    }

    #[test]
    fn test_manager_updates_any_deletes_own() {
        let org = Uuid::new_v4();
        let manager = identity(Role::Manager, org);

        let created = task_in(org, manager.id, None);
        let unrelated = task_in(org, Uuid::new_v4(), None);

        assert!(can_update_task(&manager, &unrelated));
        assert!(can_delete_task(&manager, &created));
        assert!(!can_delete_task(&manager, &unrelated));
    }

    #[test]
    fn test_assignee_cannot_delete() {
        let org = Uuid::new_v4();
        let member = identity(Role::Member, org);

        let assigned = task_in(org, Uuid::new_v4(), Some(member.id));
        assert!(can_update_task(&member, &assigned));
        assert!(!can_delete_task(&member, &assigned));
    }

    #[test]
    fn test_admin_deletes_any() {
        let org = Uuid::new_v4();
        let admin = identity(Role::Admin, org);

        let unrelated = task_in(org, Uuid::new_v4(), Some(Uuid::new_v4()));
        assert!(can_delete_task(&admin, &unrelated));
    }

    #[test]
    fn test_role_change_rules() {
        let admin = identity(Role::Admin, Uuid::new_v4());
        let manager = identity(Role::Manager, admin.org_id);

        assert!(can_change_role(&admin, Uuid::new_v4()));
        assert!(!can_change_role(&admin, admin.id));
        assert!(!can_change_role(&manager, Uuid::new_v4()));
    }
}
