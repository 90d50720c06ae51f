use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use shared::{CreateTaskRequest, Task, UpdateTaskRequest};

use crate::{
    db::{self, DbPool},
    error::{ApiError, ApiResult},
    extract::{LenientJson, SearchTerm, TaskId},
};

const MISSING_CREATE_FIELDS: &str = "The \"title\" and \"description\" properties are required.";
const MISSING_UPDATE_FIELDS: &str =
    "Provide at least one of \"title\" or \"description\" to update.";

pub async fn list_tasks(
    State(pool): State<DbPool>,
    SearchTerm(search): SearchTerm,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = db::list_tasks(&pool, search.as_deref()).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(pool): State<DbPool>,
    LenientJson(payload): LenientJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let (Some(title), Some(description)) =
        (non_empty(payload.title), non_empty(payload.description))
    else {
        return Err(ApiError::Validation(MISSING_CREATE_FIELDS.into()));
    };

    let task = db::insert_task(&pool, &Task::new(title, description)).await?;
    tracing::info!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(pool): State<DbPool>,
    TaskId(id): TaskId,
    LenientJson(payload): LenientJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let title = non_empty(payload.title);
    let description = non_empty(payload.description);
    if title.is_none() && description.is_none() {
        return Err(ApiError::Validation(MISSING_UPDATE_FIELDS.into()));
    }

    db::update_task(&pool, &id, title.as_deref(), description.as_deref(), Utc::now())
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn delete_task(
    State(pool): State<DbPool>,
    TaskId(id): TaskId,
) -> ApiResult<StatusCode> {
    if db::delete_task(&pool, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn toggle_task(
    State(pool): State<DbPool>,
    TaskId(id): TaskId,
) -> ApiResult<Json<Task>> {
    db::toggle_task_completion(&pool, &id, Utc::now())
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

// Empty strings count as absent, matching how the fields are validated.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
