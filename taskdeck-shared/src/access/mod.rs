/// Access control for TaskDeck
///
/// Two layers, checked in order on every organization-scoped request:
///
/// 1. [`permissions`]: the static role → action table. Process-lifetime
///    constant, never mutated at runtime. It grants *capability classes*
///    ("may update tasks at all").
/// 2. [`guard`]: the per-request gate combining the permission check with
///    the cross-org check, plus the ownership predicates that narrow a
///    capability to a *specific resource* ("may update this task").
///
/// The guard is pure and idempotent; it can run any number of times per
/// request without side effects.
///
/// # Example
///
/// ```
/// use taskdeck_shared::access::guard::authorize;
/// use taskdeck_shared::access::permissions::Action;
/// use taskdeck_shared::auth::middleware::Identity;
/// use taskdeck_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example(identity: &Identity, org_id: Uuid) {
/// let decision = authorize(Some(identity), Action::TaskCreate, Some(org_id));
/// # }
/// ```

pub mod guard;
pub mod permissions;
