// src/users/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

pub fn users_routes() -> Router {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/profile-details", get(handlers::profile_details))
        .route("/users/profile-update", patch(handlers::update_profile))
        .route("/users/change-password", post(handlers::change_password))
        .route("/users/upload-picture", post(handlers::upload_picture))
}
