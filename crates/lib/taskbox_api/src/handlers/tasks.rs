//! Task request handlers.
//!
//! All routes here sit behind the auth middleware; the owner is always the
//! authenticated caller, so a task belonging to someone else looks exactly
//! like a task that does not exist.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateTaskRequest, MessageResponse, TaskListResponse, TaskResponse, UpdateTaskRequest,
};
use taskbox_core::models::task::{Priority, Status};
use taskbox_core::tasks::{self, TaskUpdate};

/// Parse a path segment as a task ID. A malformed ID cannot name any task,
/// so it reports the same way as an unknown one.
fn parse_task_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Task not found.".into()))
}

/// `GET /tasks` — list the caller's tasks.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<TaskListResponse>> {
    let user_id = user.user_id()?;
    let rows = tasks::list_tasks(&state.pool, &user_id).await?;

    if rows.is_empty() {
        return Err(AppError::NotFound(
            "No tasks found. Create new tasks!".into(),
        ));
    }

    Ok(Json(TaskListResponse {
        message: "Tasks retrieved successfully.".into(),
        tasks: rows.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /tasks` — create a task owned by the caller.
pub async fn create_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let (Some(title), Some(description)) = (&body.title, &body.description) else {
        return Err(AppError::Validation(
            "Title and description are mandatory.".into(),
        ));
    };

    let priority = match body.priority.as_deref() {
        None => Priority::Low,
        Some(tag) => Priority::parse(tag).ok_or_else(|| {
            AppError::Validation("Priority must be one of LOW, MEDIUM, HIGH.".into())
        })?,
    };
    let status = match body.status.as_deref() {
        None => Status::Todo,
        Some(tag) => Status::parse(tag).ok_or_else(|| {
            AppError::Validation("Status must be one of TODO, IN_PROGRESS, DONE.".into())
        })?,
    };

    let user_id = user.user_id()?;
    let row =
        tasks::create_task(&state.pool, &user_id, title, description, priority, status).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully.".into(),
            task: row.into(),
        }),
    ))
}

/// `GET /tasks/{id}` — fetch a single task.
pub async fn get_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<TaskResponse>> {
    let user_id = user.user_id()?;
    let task_id = parse_task_id(&id)?;

    let row = tasks::get_task(&state.pool, &user_id, &task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found.".into()))?;

    Ok(Json(TaskResponse {
        message: "Task retrieved successfully.".into(),
        task: row.into(),
    }))
}

/// `PUT /tasks/{id}` — partial update: only fields present in the body change.
pub async fn update_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    let priority = match body.priority.as_deref() {
        None => None,
        Some(tag) => Some(Priority::parse(tag).ok_or_else(|| {
            AppError::Validation("Priority must be one of LOW, MEDIUM, HIGH.".into())
        })?),
    };
    let status = match body.status.as_deref() {
        None => None,
        Some(tag) => Some(Status::parse(tag).ok_or_else(|| {
            AppError::Validation("Status must be one of TODO, IN_PROGRESS, DONE.".into())
        })?),
    };

    let update = TaskUpdate {
        title: body.title,
        description: body.description,
        priority,
        status,
    };

    if update.is_empty() {
        return Err(AppError::Validation(
            "No valid fields provided to update.".into(),
        ));
    }

    let user_id = user.user_id()?;
    let task_id = parse_task_id(&id)?;

    let row = tasks::update_task(&state.pool, &user_id, &task_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found.".into()))?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully.".into(),
        task: row.into(),
    }))
}

/// `DELETE /tasks/{id}` — delete a task.
pub async fn delete_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = user.user_id()?;
    let task_id = parse_task_id(&id)?;

    let deleted = tasks::delete_task(&state.pool, &user_id, &task_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Task not found.".into()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully.".into(),
    }))
}
