/// Static role → permission table
///
/// The table is a process-lifetime constant: `Role::permissions` returns a
/// `&'static [Action]` slice per role, so lookups never allocate and nothing
/// can mutate the mapping at runtime.
///
/// Role sets are strictly nested (admin ⊇ manager ⊇ member). Admin-only
/// actions cover user/org management and audit viewing; manager adds
/// org-wide task access, reporting, and template management on top of
/// member's own-task set.
///
/// Task search has no action of its own: it is the `search` filter on
/// task listing and therefore rides the task.read.all / task.read.own
/// scope.

use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// An action a role may be granted
///
/// Actions name capability classes. Where a class comes in `.own`/`.any`
/// variants, the table grants the class and the ownership predicates in
/// `super::guard` decide which variant applies to a concrete resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    TaskCreate,
    TaskReadOwn,
    TaskReadAll,
    TaskUpdateOwn,
    TaskUpdateAny,
    TaskDeleteOwn,
    TaskDeleteAny,
    TaskAssign,
    TemplateRead,
    TemplateManage,
    ReportView,
    ReportExport,
    UserManage,
    AuditView,
    OrgManage,
    NotificationViewOwn,
    NotificationManage,
    DashboardViewAll,
    DashboardViewOwn,
}

impl Action {
    /// Converts the action to its dotted wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::TaskCreate => "task.create",
            Action::TaskReadOwn => "task.read.own",
            Action::TaskReadAll => "task.read.all",
            Action::TaskUpdateOwn => "task.update.own",
            Action::TaskUpdateAny => "task.update.any",
            Action::TaskDeleteOwn => "task.delete.own",
            Action::TaskDeleteAny => "task.delete.any",
            Action::TaskAssign => "task.assign",
            Action::TemplateRead => "template.read",
            Action::TemplateManage => "template.manage",
            Action::ReportView => "report.view",
            Action::ReportExport => "report.export",
            Action::UserManage => "user.manage",
            Action::AuditView => "audit.view",
            Action::OrgManage => "org.manage",
            Action::NotificationViewOwn => "notification.view.own",
            Action::NotificationManage => "notification.manage",
            Action::DashboardViewAll => "dashboard.view.all",
            Action::DashboardViewOwn => "dashboard.view.own",
        }
    }
}

const ADMIN_PERMISSIONS: &[Action] = &[
    Action::TaskCreate,
    Action::TaskReadOwn,
    Action::TaskReadAll,
    Action::TaskUpdateOwn,
    Action::TaskUpdateAny,
    Action::TaskDeleteOwn,
    Action::TaskDeleteAny,
    Action::TaskAssign,
    Action::TemplateRead,
    Action::TemplateManage,
    Action::ReportView,
    Action::ReportExport,
    Action::UserManage,
    Action::AuditView,
    Action::OrgManage,
    Action::NotificationViewOwn,
    Action::NotificationManage,
    Action::DashboardViewAll,
    Action::DashboardViewOwn,
];

const MANAGER_PERMISSIONS: &[Action] = &[
    Action::TaskCreate,
    Action::TaskReadOwn,
    Action::TaskReadAll,
    Action::TaskUpdateOwn,
    Action::TaskUpdateAny,
    Action::TaskDeleteOwn,
    Action::TaskAssign,
    Action::TemplateRead,
    Action::TemplateManage,
    Action::ReportView,
    Action::ReportExport,
    Action::NotificationViewOwn,
    Action::NotificationManage,
    Action::DashboardViewAll,
    Action::DashboardViewOwn,
];

const MEMBER_PERMISSIONS: &[Action] = &[
    Action::TaskCreate,
    Action::TaskReadOwn,
    Action::TaskUpdateOwn,
    Action::TaskDeleteOwn,
    Action::TemplateRead,
    Action::NotificationViewOwn,
    Action::NotificationManage,
    Action::DashboardViewOwn,
];

/// Returns the permission set for a role
pub fn permissions_for(role: Role) -> &'static [Action] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Manager => MANAGER_PERMISSIONS,
        Role::Member => MEMBER_PERMISSIONS,
    }
}

/// Checks whether a role is granted an action
pub fn has_permission(role: Role, action: Action) -> bool {
    permissions_for(role).contains(&action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_sets_are_nested() {
        // admin ⊇ manager ⊇ member
        for action in MANAGER_PERMISSIONS {
            assert!(
                ADMIN_PERMISSIONS.contains(action),
                "admin missing manager action {:?}",
                action
            );
        }
        for action in MEMBER_PERMISSIONS {
            assert!(
                MANAGER_PERMISSIONS.contains(action),
                "manager missing member action {:?}",
                action
            );
        }
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [
            Action::TaskDeleteAny,
            Action::UserManage,
            Action::AuditView,
            Action::OrgManage,
        ] {
            assert!(has_permission(Role::Admin, action));
            assert!(!has_permission(Role::Manager, action));
            assert!(!has_permission(Role::Member, action));
        }
    }

    #[test]
    fn test_member_lacks_org_wide_actions() {
        assert!(!has_permission(Role::Member, Action::TaskAssign));
        assert!(!has_permission(Role::Member, Action::TaskReadAll));
        assert!(!has_permission(Role::Member, Action::TaskUpdateAny));
        assert!(!has_permission(Role::Member, Action::ReportView));
        assert!(!has_permission(Role::Member, Action::DashboardViewAll));
        assert!(!has_permission(Role::Member, Action::TemplateManage));
    }

    #[test]
    fn test_template_actions() {
        for role in [Role::Admin, Role::Manager, Role::Member] {
            assert!(has_permission(role, Action::TemplateRead));
        }
        assert!(has_permission(Role::Admin, Action::TemplateManage));
        assert!(has_permission(Role::Manager, Action::TemplateManage));
        assert!(!has_permission(Role::Member, Action::TemplateManage));
    }

    #[test]
    fn test_everyone_can_create_and_see_own() {
        for role in [Role::Admin, Role::Manager, Role::Member] {
            assert!(has_permission(role, Action::TaskCreate));
            assert!(has_permission(role, Action::TaskReadOwn));
            assert!(has_permission(role, Action::NotificationViewOwn));
            assert!(has_permission(role, Action::DashboardViewOwn));
        }
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(Action::TaskUpdateAny.as_str(), "task.update.any");
        assert_eq!(Action::UserManage.as_str(), "user.manage");
        assert_eq!(Action::AuditView.as_str(), "audit.view");
    }
}
