use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{parse_id_list, reject_unknown_fields, FieldErrors};
use crate::core::state::AppState;
use crate::core::time::parse_datetime;
use crate::db::models::Task;
use crate::db::types::TaskStatus;
use crate::schemas::task::{StatusUpdateRequest, TaskCreateRequest, TaskResponse, TaskUpdateRequest};
use crate::schemas::{MessageResponse, Normalize};
use crate::services::tasks::{self, NewTask, TaskChanges};

const DEADLINE_MESSAGE: &str = "Please enter a valid deadline with date and time";
const ASSIGNEES_MESSAGE: &str = "Assigned users must be an array";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:task_id", get(get_task).put(update_task).delete(delete_task))
        .route("/:task_id/status", patch(update_status))
}

async fn list_tasks(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let visible = tasks::list_for(state.store(), &user).await?;
    let populated = tasks::populate(state.store(), visible).await?;

    Ok(Json(populated.into_iter().map(TaskResponse::from_populated).collect()))
}

async fn get_task(
    Path(task_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = tasks::get_for(state.store(), &user, &task_id).await?;
    Ok(Json(respond_one(&state, task).await?))
}

async fn create_task(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<TaskCreateRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    payload.normalize();

    let mut errors = FieldErrors::validate(&payload);
    let deadline = read_deadline(payload.deadline.as_deref(), &mut errors);
    let assigned_to = match payload.assigned_to.as_ref() {
        Some(value) => read_assignees(value, &mut errors),
        None => {
            errors.push("assignedTo", ASSIGNEES_MESSAGE);
            None
        }
    };
    errors.into_result()?;

    let (Some(deadline), Some(assigned_to)) = (deadline, assigned_to) else {
        return Err(ApiError::BadRequest("Invalid task".to_string()));
    };

    let task = tasks::create(
        state.store(),
        &admin,
        NewTask {
            title: payload.title,
            short_description: payload.short_description,
            long_description: payload.long_description,
            deadline,
            assigned_to,
        },
    )
    .await?;

    tracing::info!(
        admin_id = %admin.id,
        task_id = %task.id,
        assignees = task.assigned_to.len(),
        action = "task_create",
        "Admin created task"
    );

    Ok((StatusCode::CREATED, Json(respond_one(&state, task).await?)))
}

async fn update_status(
    Path(task_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StatusUpdateRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let status = TaskStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::field("status", "Invalid status"))?;

    let task = tasks::set_status(state.store(), &user, &task_id, status).await?;

    tracing::info!(
        user_id = %user.id,
        task_id = %task.id,
        status = status.as_str(),
        "Task status updated"
    );

    Ok(Json(respond_one(&state, task).await?))
}

async fn update_task(
    Path(task_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<TaskUpdateRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    payload.normalize();

    let mut errors = FieldErrors::validate(&payload);
    reject_unknown_fields(&payload.extra, &mut errors);
    let deadline = read_deadline(payload.deadline.as_deref(), &mut errors);
    let assigned_to = match payload.assigned_to.as_ref() {
        Some(value) => read_assignees(value, &mut errors),
        None => None,
    };
    errors.into_result()?;

    let Some(deadline) = deadline else {
        return Err(ApiError::field("deadline", DEADLINE_MESSAGE));
    };

    let task = tasks::update(
        state.store(),
        &admin,
        &task_id,
        TaskChanges {
            title: payload.title,
            short_description: payload.short_description,
            long_description: payload.long_description,
            deadline,
            assigned_to,
        },
    )
    .await?;

    tracing::info!(
        admin_id = %admin.id,
        task_id = %task.id,
        action = "task_update",
        "Admin updated task"
    );

    Ok(Json(respond_one(&state, task).await?))
}

async fn delete_task(
    Path(task_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    tasks::delete(state.store(), &admin, &task_id).await?;

    tracing::info!(
        admin_id = %admin.id,
        task_id = %task_id,
        action = "task_delete",
        "Admin deleted task"
    );

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

fn read_deadline(raw: Option<&str>, errors: &mut FieldErrors) -> Option<OffsetDateTime> {
    let parsed = raw.and_then(parse_datetime);
    if parsed.is_none() {
        errors.push("deadline", DEADLINE_MESSAGE);
    }
    parsed
}

fn read_assignees(value: &Value, errors: &mut FieldErrors) -> Option<Vec<String>> {
    let parsed = parse_id_list(value);
    if parsed.is_none() {
        errors.push("assignedTo", ASSIGNEES_MESSAGE);
    }
    parsed
}

async fn respond_one(state: &AppState, task: Task) -> Result<TaskResponse, ApiError> {
    tasks::populate(state.store(), vec![task])
        .await?
        .pop()
        .map(TaskResponse::from_populated)
        .ok_or_else(|| ApiError::Internal("Failed to load task".to_string()))
}
