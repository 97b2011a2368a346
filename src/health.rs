// src/health.rs

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::common::AppState;

/// GET|HEAD /health - Liveness plus a database round trip
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "healthy" })),
        ),
        Err(e) => {
            error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "error" })),
            )
        }
    }
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
