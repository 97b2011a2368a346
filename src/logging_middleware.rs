// src/logging_middleware.rs
//! Middleware for logging request and response bodies at debug level
//!
//! Credentials never reach the log: JSON fields holding tokens or passwords
//! are masked and non-JSON bodies (such as the login form) are logged by size only.

use axum::body::to_bytes;
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

const MASK: &str = "***";

const SENSITIVE_FIELDS: [&str; 7] = [
    "access_token",
    "refresh_token",
    "id_token",
    "password",
    "current_password",
    "new_password",
    "client_secret",
];

/// Replace sensitive fields anywhere in a JSON document
fn mask_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if SENSITIVE_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(MASK.to_string());
                } else {
                    mask_sensitive(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_sensitive),
        _ => {}
    }
}

fn describe_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            mask_sensitive(&mut json);
            Some(json.to_string())
        }
        Err(_) => Some(format!("<{} bytes>", bytes.len())),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(request_body) = describe_body(&bytes) {
        debug!(method = %parts.method, uri = %parts.uri, request_body = %request_body, "Request");
    }

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(response_body) = describe_body(&bytes) {
        debug!(status = %parts.status, response_body = %response_body, "Response");
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
