/// Database models for TaskDeck
///
/// This module contains all database models and their CRUD operations.
/// Every model except `organization` carries an `org_id` column; query
/// methods that serve request paths take the acting organization's id and
/// filter on it, so cross-tenant rows are unreachable by construction.
///
/// # Models
///
/// - `organization`: Root tenant boundary
/// - `user`: User accounts, roles, and notification preferences
/// - `task`: Tasks with status/priority/assignee and recurrence fields
/// - `template`: Reusable task blueprints (name, title, priority, assignee)
/// - `activity`: Append-only per-task event log (comments, status, assignment)
/// - `notification`: In-app notification records
/// - `audit_log`: Append-only audit trail of mutating actions
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, Role, User};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     org_id: Uuid::new_v4(),
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Member,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod activity;
pub mod audit_log;
pub mod notification;
pub mod organization;
pub mod task;
pub mod template;
pub mod user;
