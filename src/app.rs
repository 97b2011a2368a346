// src/app.rs
//! Router composition shared by `main` and the router tests

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::AppState;
use crate::{admin, auth, health, logging_middleware, tasks, users};

pub fn app_router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-token-type"),
            HeaderName::from_static("x-admin-token"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true);

    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // ACCOUNT AND TASK ROUTES
        // ====================================================================
        .merge(users::users_routes())
        .merge(tasks::tasks_routes())
        // ====================================================================
        // ADMIN AND HEALTH ROUTES
        // ====================================================================
        .merge(admin::admin_routes())
        .merge(health::health_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        // Add request/response body logging in debug mode
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
