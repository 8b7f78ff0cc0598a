/// Task template endpoints
///
/// # Endpoints
///
/// - `GET    /v1/orgs/:org_id/templates` - List templates
/// - `POST   /v1/orgs/:org_id/templates` - Create a template
/// - `GET    /v1/orgs/:org_id/templates/:id` - Fetch one
/// - `PUT    /v1/orgs/:org_id/templates/:id` - Partial update
/// - `DELETE /v1/orgs/:org_id/templates/:id` - Delete
///
/// Reads require template.read (all roles); writes require
/// template.manage (admin and manager).

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::{
    access::permissions::Action,
    audit,
    auth::middleware::Identity,
    models::task::TaskPriority,
    models::template::{NewTemplate, TaskTemplate},
    models::user::User,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{check_org_access, client_ip, Pagination},
    response::{ApiResponse, Meta},
};

/// Create-template request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Update-template request body; absent fields are left unchanged,
/// explicit `null` clears the assignee
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

fn validate_label(field: &str, value: &str) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError(format!(
            "{} must not be empty",
            field
        )));
    }
    if trimmed.chars().count() > 200 {
        return Err(ApiError::ValidationError(format!(
            "{} must be at most 200 characters",
            field
        )));
    }
    Ok(())
}

/// Resolves an optional assignee against the organization
async fn resolve_assignee(
    state: &AppState,
    org_id: Uuid,
    assignee_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(id) = assignee_id {
        User::find_by_id_and_org(&state.db, id, org_id)
            .await?
            .ok_or_else(|| {
                ApiError::ValidationError("Assignee not found in this organization".to_string())
            })?;
    }
    Ok(())
}

fn template_snapshot(template: &TaskTemplate) -> serde_json::Value {
    json!({
        "name": template.name,
        "title": template.title,
        "priority": template.priority.as_str(),
        "assigneeId": template.assignee_id,
    })
}

/// List templates of the organization, sorted by name
pub async fn list_templates(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<TaskTemplate>>>> {
    check_org_access(&identity, Action::TemplateRead, org_id)?;

    let (page, limit, offset) = pagination.resolve();

    let templates = TaskTemplate::list_by_org(&state.db, org_id, limit, offset).await?;
    let total = TaskTemplate::count_by_org(&state.db, org_id).await?;

    Ok(Json(ApiResponse::ok_with_meta(
        templates,
        Meta::paginated(page, limit, total),
    )))
}

/// Fetch one template
pub async fn get_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<TaskTemplate>>> {
    check_org_access(&identity, Action::TemplateRead, org_id)?;

    let template = TaskTemplate::find_by_id_and_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(Json(ApiResponse::ok(template)))
}

/// Create a template
pub async fn create_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskTemplate>>)> {
    check_org_access(&identity, Action::TemplateManage, org_id)?;

    req.validate().map_err(|e| {
        ApiError::ValidationError(
            e.field_errors()
                .iter()
                .flat_map(|(_, errors)| {
                    errors.iter().map(|error| {
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string())
                    })
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    resolve_assignee(&state, org_id, req.assignee_id).await?;

    let template = TaskTemplate::insert(
        &state.db,
        NewTemplate {
            org_id,
            name: req.name.trim().to_string(),
            title: req.title.trim().to_string(),
            description: req.description,
            priority: req.priority,
            assignee_id: req.assignee_id,
            created_by: identity.id,
        },
    )
    .await?;

    audit::record(
        &state.db,
        &identity,
        "create",
        "task_template",
        Some(template.id),
        audit::change_set(None, Some(template_snapshot(&template))),
        client_ip(&headers),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(template))))
}

/// Partially update a template
pub async fn update_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<UpdateTemplateRequest>,
) -> ApiResult<Json<ApiResponse<TaskTemplate>>> {
    check_org_access(&identity, Action::TemplateManage, org_id)?;

    let before = TaskTemplate::find_by_id_and_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    let name = req.name.unwrap_or_else(|| before.name.clone());
    let title = req.title.unwrap_or_else(|| before.title.clone());
    validate_label("Name", &name)?;
    validate_label("Title", &title)?;

    let assignee_id = req.assignee_id.unwrap_or(before.assignee_id);
    if assignee_id != before.assignee_id {
        resolve_assignee(&state, org_id, assignee_id).await?;
    }

    let template = TaskTemplate::apply_update(
        &state.db,
        id,
        org_id,
        name.trim(),
        title.trim(),
        &req.description.unwrap_or_else(|| before.description.clone()),
        req.priority.unwrap_or(before.priority),
        assignee_id,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    audit::record(
        &state.db,
        &identity,
        "update",
        "task_template",
        Some(template.id),
        audit::change_set(
            Some(template_snapshot(&before)),
            Some(template_snapshot(&template)),
        ),
        client_ip(&headers),
    )
    .await;

    Ok(Json(ApiResponse::ok(template)))
}

/// Delete a template
///
/// Tasks spawned earlier are untouched; they carry no reference back to
/// the template.
pub async fn delete_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    check_org_access(&identity, Action::TemplateManage, org_id)?;

    let template = TaskTemplate::find_by_id_and_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    if !TaskTemplate::delete(&state.db, id, org_id).await? {
        return Err(ApiError::NotFound("Template not found".to_string()));
    }

    audit::record(
        &state.db,
        &identity,
        "delete",
        "task_template",
        Some(id),
        audit::change_set(Some(template_snapshot(&template)), None),
        client_ip(&headers),
    )
    .await;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}
