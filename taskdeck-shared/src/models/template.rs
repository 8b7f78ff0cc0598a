/// Task template model and database operations
///
/// Templates are reusable blueprints for task creation: a named bundle of
/// title, description, priority, and an optional default assignee. They
/// are org-scoped like every other entity; the template name is unique
/// within an organization.
///
/// Tasks spawned from a template carry no back-reference to it — the
/// spawn is recorded in the audit log instead.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_templates (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(200) NOT NULL,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (org_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskPriority;

/// Task template model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    /// Unique template ID
    pub id: Uuid,

    /// Organization this template belongs to
    pub org_id: Uuid,

    /// Template name, unique within the organization
    pub name: String,

    /// Title given to tasks spawned from this template
    pub title: String,

    /// Description given to spawned tasks
    pub description: String,

    /// Priority given to spawned tasks
    pub priority: TaskPriority,

    /// Default assignee for spawned tasks (must belong to the same org)
    pub assignee_id: Option<Uuid>,

    /// User who created the template
    pub created_by: Uuid,

    /// When the template was created
    pub created_at: DateTime<Utc>,

    /// When the template was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new template
#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub org_id: Uuid,
    pub name: String,
    pub title: String,
    pub description: String,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
}

const TEMPLATE_COLUMNS: &str = "id, org_id, name, title, description, priority, assignee_id, \
     created_by, created_at, updated_at";

impl TaskTemplate {
    /// Inserts a new template
    pub async fn insert(pool: &PgPool, data: NewTemplate) -> Result<Self, sqlx::Error> {
        let template = sqlx::query_as::<_, TaskTemplate>(&format!(
            r#"
            INSERT INTO task_templates (org_id, name, title, description, priority, assignee_id,
                                        created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(data.org_id)
        .bind(data.name)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority.unwrap_or_default())
        .bind(data.assignee_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(template)
    }

    /// Finds a template by ID with org isolation
    pub async fn find_by_id_and_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let template = sqlx::query_as::<_, TaskTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM task_templates WHERE id = $1 AND org_id = $2"
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(template)
    }

    /// Lists templates of an organization, sorted by name
    pub async fn list_by_org(
        pool: &PgPool,
        org_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let templates = sqlx::query_as::<_, TaskTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM task_templates
            WHERE org_id = $1
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(org_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(templates)
    }

    /// Counts templates of an organization
    pub async fn count_by_org(pool: &PgPool, org_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM task_templates WHERE org_id = $1")
                .bind(org_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Applies already-resolved values to a template row
    ///
    /// Callers resolve the patch against the current row first, the same
    /// way task updates go through `crate::mutation`.
    pub async fn apply_update(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        name: &str,
        title: &str,
        description: &str,
        priority: TaskPriority,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let template = sqlx::query_as::<_, TaskTemplate>(&format!(
            r#"
            UPDATE task_templates
            SET name = $3, title = $4, description = $5, priority = $6, assignee_id = $7,
                updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(org_id)
        .bind(name)
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(assignee_id)
        .fetch_optional(pool)
        .await?;

        Ok(template)
    }

    /// Hard-deletes a template, scoped to its organization
    pub async fn delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(org_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
