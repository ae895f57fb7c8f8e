use crate::{app::AppState, error::ApiError, routes::double_option};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use workboard_shared::auth::Actor;
use workboard_shared::models::task::{AssigneeSelector, SortDirection, TaskSortKey};
use workboard_shared::projection::{CommentView, TaskView};
use workboard_shared::query::{DashboardStats, TaskListParams, TaskPage, DEFAULT_PAGE_SIZE};
use workboard_shared::service::{TaskDraft, TaskPatch};

/// Query parameters for task listing
///
/// Everything arrives as an optional string and is coerced, never
/// rejected: unparseable numbers fall back to the defaults and unknown
/// sort or filter values fall back to their documented defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub assigned_to: Option<String>,
}

impl ListTasksQuery {
    fn into_params(self) -> TaskListParams {
        TaskListParams {
            page: self
                .page
                .as_deref()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(1),
            per_page: self
                .per_page
                .as_deref()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            sort_by: TaskSortKey::from_param(self.sort_by.as_deref().unwrap_or("")),
            sort_dir: SortDirection::from_param(self.sort_dir.as_deref().unwrap_or("")),
            assignee: self
                .assigned_to
                .as_deref()
                .map(AssigneeSelector::from_param)
                .unwrap_or(AssigneeSelector::Any),
        }
    }
}

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(length(max = 200, message = "Title must not exceed 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

impl CreateTaskRequest {
    fn into_draft(self) -> TaskDraft {
        TaskDraft {
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            priority: self.priority,
            status: self.status,
            start_date: self.start_date,
            due_date: self.due_date,
        }
    }
}

/// Task update request
///
/// Nullable fields use the double-`Option` encoding so an absent key
/// leaves the stored value alone while an explicit `null` clears it.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200, message = "Title must not exceed 200 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

impl UpdateTaskRequest {
    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            priority: self.priority,
            status: self.status,
            start_date: self.start_date,
            due_date: self.due_date,
        }
    }
}

/// Status-only update request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Comment creation request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub body: Option<String>,
}

/// Lists tasks visible to the authenticated user
///
/// # Endpoint
///
/// `GET /v1/tasks?page=1&per_page=10&sort_by=due_date&sort_dir=asc&assigned_to=<uuid>`
///
/// # Response
///
/// A page of tasks plus pagination metadata. Developers only ever see
/// tasks assigned to them; the `assigned_to` filter (a user id or the
/// literal `unassigned`) is honored for admins only.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskPage>, ApiError> {
    let page = state.queries.list_tasks(&actor, query.into_params()).await?;
    Ok(Json(page))
}

/// Creates a new task
///
/// # Endpoint
///
/// `POST /v1/tasks`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Ship the release",
///   "description": "Cut and tag v1.2",
///   "assigned_to": "a1b2...",
///   "priority": "High",
///   "status": "Pending",
///   "start_date": "2025-08-01",
///   "due_date": "2025-08-15"
/// }
/// ```
///
/// Only `title` is required. Priority defaults to `Medium`, status to
/// `Pending`.
///
/// # Errors
///
/// - 400 on a missing title, an invalid enum value, or a malformed date
/// - 403 when the caller is not an admin
/// - 404 when the assignee does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    req.validate()?;

    let task = state.tasks.create_task(&actor, req.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially updates a task
///
/// # Endpoint
///
/// `PUT /v1/tasks/{id}`
///
/// # Response
///
/// The updated task. Omitted fields are untouched; `null` clears
/// description, assignee, and the dates.
///
/// # Errors
///
/// - 400 on invalid field values
/// - 403 when the caller may not touch this task, or a non-admin
///   attempts to reassign it
/// - 404 when the task (or a new assignee) does not exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>, ApiError> {
    req.validate()?;

    let task = state
        .tasks
        .update_task(&actor, task_id, req.into_patch())
        .await?;
    Ok(Json(task))
}

/// Deletes a task and its comments
///
/// # Endpoint
///
/// `DELETE /v1/tasks/{id}`
///
/// # Errors
///
/// - 403 when the caller is not an admin
/// - 404 when the task does not exist
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete_task(&actor, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Updates only the status of a task
///
/// # Endpoint
///
/// `PUT /v1/tasks/{id}/status`
///
/// # Request Body
///
/// ```json
/// { "status": "Completed" }
/// ```
///
/// # Errors
///
/// - 400 when the status is missing, empty, or not a known value
/// - 403 when the caller may not touch this task
/// - 404 when the task does not exist
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<TaskView>, ApiError> {
    let task = state.tasks.update_status(&actor, task_id, req.status).await?;
    Ok(Json(task))
}

/// Lists comments on a task, oldest first
///
/// # Endpoint
///
/// `GET /v1/tasks/{id}/comments`
///
/// # Errors
///
/// - 403 when the caller may not view this task
/// - 404 when the task does not exist
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = state.queries.list_comments(&actor, task_id).await?;
    Ok(Json(comments))
}

/// Adds a comment to a task
///
/// # Endpoint
///
/// `POST /v1/tasks/{id}/comments`
///
/// # Request Body
///
/// ```json
/// { "body": "Blocked on the design review" }
/// ```
///
/// # Errors
///
/// - 400 when the body is missing or blank after trimming
/// - 403 when the caller may not view this task
/// - 404 when the task does not exist
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let comment = state.tasks.add_comment(&actor, task_id, req.body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Role-scoped dashboard statistics
///
/// # Endpoint
///
/// `GET /v1/dashboard/stats`
///
/// # Response
///
/// ```json
/// {
///   "total_tasks": 12,
///   "completed_tasks": 4,
///   "pending_tasks": 5,
///   "in_progress_tasks": 3,
///   "overdue_tasks": 2
/// }
/// ```
///
/// Admins see counts over every task; developers see only their own
/// assignments. A task is overdue when its due date has passed and it
/// is not completed.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state.queries.dashboard_stats(&actor).await?;
    Ok(Json(stats))
}
