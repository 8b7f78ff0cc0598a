/// User model and database operations
///
/// Users belong to exactly one organization and carry a role that determines
/// their static permission set (see `access::permissions`). Email addresses
/// are stored lowercased and are unique within an organization.
///
/// The password hash is excluded from serialization, so a `User` can be
/// returned from an API handler without leaking credentials.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     email VARCHAR(320) NOT NULL,
///     password_hash TEXT NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     notify_email BOOLEAN NOT NULL DEFAULT TRUE,
///     notify_in_app BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (org_id, email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role within an organization
///
/// Determines the static permission set. Roles are strictly nested:
/// admin ⊇ manager ⊇ member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access including user/org management and audit viewing
    Admin,

    /// Task management across the org, but no user/org administration
    Manager,

    /// Own-task access only
    Member,
}

impl Role {
    /// Converts role to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    /// Parses a role from its wire representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// Per-user notification preferences
///
/// Preferences configure delivery channels; notification records are
/// created regardless of these flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    /// Email channel enabled
    pub email: bool,

    /// In-app channel enabled
    pub in_app: bool,
}

/// User model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Organization this user belongs to
    pub org_id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (lowercased, unique within org)
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Role within the organization
    pub role: Role,

    /// Email notification preference
    #[serde(skip)]
    pub notify_email: bool,

    /// In-app notification preference
    #[serde(skip)]
    pub notify_in_app: bool,

    /// Last successful login (null until first login)
    pub last_login_at: Option<DateTime<Utc>>,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the user's notification preferences
    pub fn notification_prefs(&self) -> NotificationPrefs {
        NotificationPrefs {
            email: self.notify_email,
            in_app: self.notify_in_app,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Organization ID
    pub org_id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (will be lowercased)
    pub email: String,

    /// Pre-hashed password
    pub password_hash: String,

    /// Role within the organization
    pub role: Role,
}

const USER_COLUMNS: &str = "id, org_id, name, email, password_hash, role, \
     notify_email, notify_in_app, last_login_at, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on unique-constraint violation (duplicate
    /// email within the organization).
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (org_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.name)
        .bind(data.email.to_lowercase())
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID with org isolation
    ///
    /// This is the preferred method for API endpoints.
    pub async fn find_by_id_and_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND org_id = $2"
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email, optionally restricted to one organization
    ///
    /// Without an org filter the first match across organizations is
    /// returned, matching the login flow when no org slug is supplied.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
        org_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = match org_id {
            Some(org_id) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND org_id = $2"
                ))
                .bind(email.to_lowercase())
                .bind(org_id)
                .fetch_optional(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at LIMIT 1"
                ))
                .bind(email.to_lowercase())
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(user)
    }

    /// Resolves a set of lowercased emails to users of one organization
    ///
    /// Used for mention resolution; emails with no matching user are simply
    /// absent from the result.
    pub async fn find_by_emails_in_org(
        pool: &PgPool,
        org_id: Uuid,
        emails: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE org_id = $1 AND email = ANY($2)"
        ))
        .bind(org_id)
        .bind(emails)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Lists users of an organization with pagination, newest first
    pub async fn list_by_org(
        pool: &PgPool,
        org_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE org_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts users of an organization
    pub async fn count_by_org(pool: &PgPool, org_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE org_id = $1")
            .bind(org_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Updates a user's role, scoped to their organization
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(org_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user's notification preferences
    pub async fn update_notification_prefs(
        pool: &PgPool,
        id: Uuid,
        email: Option<bool>,
        in_app: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET notify_email = COALESCE($2, notify_email),
                notify_in_app = COALESCE($3, notify_in_app),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(in_app)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stamps the last-login timestamp
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Deletes a user, scoped to their organization
    pub async fn delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(org_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Manager.as_str(), "manager");
        assert_eq!(Role::Member.as_str(), "member");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Member,
            notify_email: true,
            notify_in_app: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
        assert!(json.contains("jane@example.com"));
    }

    #[test]
    fn test_notification_prefs_shape() {
        let prefs = NotificationPrefs {
            email: true,
            in_app: false,
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["email"], true);
        assert_eq!(json["inApp"], false);
    }
}
