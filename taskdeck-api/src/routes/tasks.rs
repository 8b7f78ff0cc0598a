/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/orgs/:org_id/tasks` - List with filters and pagination
/// - `POST   /v1/orgs/:org_id/tasks` - Create
/// - `GET    /v1/orgs/:org_id/tasks/:id` - Fetch one
/// - `PUT    /v1/orgs/:org_id/tasks/:id` - Partial update
/// - `DELETE /v1/orgs/:org_id/tasks/:id` - Delete
/// - `PUT    /v1/orgs/:org_id/tasks/:id/assign` - Reassign/unassign
/// - `GET    /v1/orgs/:org_id/tasks/:id/activity` - Activity feed
/// - `POST   /v1/orgs/:org_id/tasks/:id/comments` - Add comment
/// - `POST   /v1/orgs/:org_id/tasks/from-template` - Spawn from a template

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use taskdeck_shared::{
    access::guard::{can_read_task, has_all_read_scope},
    access::permissions::Action,
    auth::middleware::Identity,
    models::activity::TaskActivity,
    models::task::{RecurringFrequency, Task, TaskFilter, TaskPriority, TaskStatus},
    mutation::{self, CreateTaskInput, TaskPatch},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{check_org_access, client_ip, Pagination},
    response::{ApiResponse, Meta},
};

/// Query parameters for task listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Create-task request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_recurring: bool,

    pub recurring_frequency: Option<RecurringFrequency>,
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Update-task request body; absent fields are left unchanged, explicit
/// `null` clears nullable fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Assign request body; `null` (or absent) unassigns
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub assignee_id: Option<Uuid>,
}

/// Comment request body
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

/// From-template request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromTemplateRequest {
    pub template_id: Uuid,
}

/// List tasks with filters and pagination
///
/// Members see only tasks they created or are assigned; managers and
/// admins see the whole organization.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    check_org_access(&identity, Action::TaskReadOwn, org_id)?;

    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit, offset) = pagination.resolve();

    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assignee_id: query.assignee_id,
        search: query.search,
        owner_scope: if has_all_read_scope(&identity) {
            None
        } else {
            Some(identity.id)
        },
    };

    let tasks = Task::list_by_org(&state.db, org_id, &filter, limit, offset).await?;
    let total = Task::count_by_org(&state.db, org_id, &filter).await?;

    Ok(Json(ApiResponse::ok_with_meta(
        tasks,
        Meta::paginated(page, limit, total),
    )))
}

/// Create a task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    check_org_access(&identity, Action::TaskCreate, org_id)?;

    let task = mutation::create_task(
        &state.db,
        &identity,
        CreateTaskInput {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            tags: req.tags,
            due_date: req.due_date,
            is_recurring: req.is_recurring,
            recurring_frequency: req.recurring_frequency,
        },
        client_ip(&headers),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

/// Spawn a task from a template
///
/// The new task starts in `todo` with the template's title, description,
/// priority, and default assignee. Unknown or cross-org templates are 404.
pub async fn create_task_from_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<FromTemplateRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    check_org_access(&identity, Action::TaskCreate, org_id)?;

    let task = mutation::create_task_from_template(
        &state.db,
        &identity,
        req.template_id,
        client_ip(&headers),
    )
    .await
    .map_err(|e| match e {
        mutation::MutationError::NotFound => {
            ApiError::NotFound("Template not found".to_string())
        }
        other => ApiError::from(other),
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

/// Fetch one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    check_org_access(&identity, Action::TaskReadOwn, org_id)?;

    let task = Task::find_by_id_and_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !can_read_task(&identity, &task) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    Ok(Json(ApiResponse::ok(task)))
}

/// Partially update a task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    check_org_access(&identity, Action::TaskUpdateOwn, org_id)?;

    let task = mutation::update_task(
        &state.db,
        &identity,
        id,
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            tags: req.tags,
            due_date: req.due_date,
        },
        client_ip(&headers),
    )
    .await?;

    Ok(Json(ApiResponse::ok(task)))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    check_org_access(&identity, Action::TaskDeleteOwn, org_id)?;

    mutation::delete_task(&state.db, &identity, id, client_ip(&headers)).await?;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}

/// Reassign or unassign a task
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    check_org_access(&identity, Action::TaskAssign, org_id)?;

    let task =
        mutation::assign_task(&state.db, &identity, id, req.assignee_id, client_ip(&headers))
            .await?;

    Ok(Json(ApiResponse::ok(task)))
}

/// Activity feed for a task, newest first
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<ApiResponse<Vec<TaskActivity>>>> {
    check_org_access(&identity, Action::TaskReadOwn, org_id)?;

    let task = Task::find_by_id_and_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !can_read_task(&identity, &task) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    let (_, limit, _) = pagination.resolve();
    let activity = TaskActivity::list_by_task(&state.db, org_id, id, limit).await?;

    Ok(Json(ApiResponse::ok(activity)))
}

/// Add a comment to a task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskActivity>>)> {
    check_org_access(&identity, Action::TaskReadOwn, org_id)?;

    let activity =
        mutation::add_comment(&state.db, &identity, id, req.body, client_ip(&headers)).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(activity))))
}
