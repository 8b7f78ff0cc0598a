/// Organization model and database operations
///
/// Organizations are the root tenant boundary. Every other entity carries an
/// `org_id` foreign key that must match the acting user's organization on
/// every read and write.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     slug VARCHAR(200) NOT NULL UNIQUE,
///     plan org_plan NOT NULL DEFAULT 'free',
///     settings JSONB NOT NULL DEFAULT '{"timezone":"UTC","language":"en"}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Organization subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgPlan {
    Free,
    Pro,
    Enterprise,
}

/// Organization model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Unique organization ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-friendly identifier, unique across all organizations
    pub slug: String,

    /// Subscription plan
    pub plan: OrgPlan,

    /// Free-form settings blob (timezone, language)
    pub settings: JsonValue,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Display name
    pub name: String,

    /// URL-friendly identifier
    pub slug: String,
}

impl Organization {
    /// Creates a new organization on the free plan
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, plan, settings, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await?;

        Ok(org)
    }

    /// Finds an organization by its slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, slug, plan, settings, created_at, updated_at
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Finds an organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, slug, plan, settings, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }
}

/// Derives a slug from an organization name: lowercase, whitespace runs
/// collapsed to single hyphens.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Widgets   Inc  "), "widgets-inc");
        assert_eq!(slugify("solo"), "solo");
    }

    #[test]
    fn test_plan_serialization() {
        assert_eq!(serde_json::to_string(&OrgPlan::Free).unwrap(), "\"free\"");
        assert_eq!(
            serde_json::to_string(&OrgPlan::Enterprise).unwrap(),
            "\"enterprise\""
        );
    }
}
