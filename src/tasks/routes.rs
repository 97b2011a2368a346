// src/tasks/routes.rs

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers;

pub fn tasks_routes() -> Router {
    Router::new()
        .route("/tasks/create", post(handlers::create_task))
        .route("/tasks/get/all-tasks", get(handlers::list_tasks))
        .route("/tasks/get/:id", get(handlers::get_task))
        .route("/tasks/update/:id", patch(handlers::update_task))
        .route("/tasks/delete/:id", delete(handlers::delete_task))
}
