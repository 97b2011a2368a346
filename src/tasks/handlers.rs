// src/tasks/handlers.rs

use axum::extract::{Extension, Json, Path};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::models::*;
use super::validators::TaskValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

/// Load a task owned by `user_id`; tasks of other accounts look missing
async fn owned_task(db: &SqlitePool, task_id: i64, user_id: i64) -> Result<Task, ApiError> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            debug!(task_id, user_id, "Task not found for user");
            ApiError::NotFound("Task not found".into())
        })
}

/// POST /tasks/create
pub async fn create_task(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Json(body): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    TaskValidator.validate(&body).into_result()?;

    let now = Utc::now();
    let completed_at = body.completed.then_some(now);

    let result = sqlx::query(
        r#"INSERT INTO tasks (user_id, name, description, priority, due_date, completed, created_at, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(authed.id())
    .bind(&body.name)
    .bind(body.description.as_deref())
    .bind(&body.priority)
    .bind(body.due_date)
    .bind(body.completed)
    .bind(now)
    .bind(completed_at)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = authed.id(), "Database error creating task");
        ApiError::DatabaseError(e)
    })?;

    let task = owned_task(&state.db, result.last_insert_rowid(), authed.id()).await?;
    info!(task_id = task.id, user_id = authed.id(), "Task created");
    Ok(Json(task))
}

/// GET /tasks/get/all-tasks
pub async fn list_tasks(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = ? ORDER BY id")
        .bind(authed.id())
        .fetch_all(&state.db)
        .await?;
    Ok(Json(tasks))
}

/// GET /tasks/get/:id
pub async fn get_task(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(owned_task(&state.db, task_id, authed.id()).await?))
}

/// PATCH /tasks/update/:id
pub async fn update_task(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    TaskValidator.validate(&body).into_result()?;

    let mut task = owned_task(&state.db, task_id, authed.id()).await?;
    task.apply(body, Utc::now());

    sqlx::query(
        r#"UPDATE tasks SET name = ?, description = ?, priority = ?, due_date = ?, completed = ?, completed_at = ?
        WHERE id = ? AND user_id = ?"#,
    )
    .bind(&task.name)
    .bind(task.description.as_deref())
    .bind(&task.priority)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(task.id)
    .bind(authed.id())
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Database error updating task");
        ApiError::DatabaseError(e)
    })?;

    info!(task_id, user_id = authed.id(), "Task updated");
    Ok(Json(task))
}

/// DELETE /tasks/delete/:id
pub async fn delete_task(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Path(task_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(task_id)
        .bind(authed.id())
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Task not found".into()));
    }

    info!(task_id, user_id = authed.id(), "Task deleted");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}
