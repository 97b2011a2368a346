//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/token` - Password login
/// - `POST /auth/refresh-token` - Exchange a refresh token for a new access token
/// - `POST /auth/validate-token` - Check a token against an expected kind
/// - `GET /auth/protected` - Requires a valid access token
/// - `POST /auth/logout` - Clear session cookies
/// - `GET /auth/google/login` - Redirect to Google
/// - `GET /auth/google/callback` - Google redirect target
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/token", post(handlers::login))
        .route("/auth/refresh-token", post(handlers::refresh_token))
        .route("/auth/validate-token", post(handlers::validate_token))
        .route("/auth/protected", get(handlers::protected))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/google/login", get(handlers::google_login))
        .route("/auth/google/callback", get(handlers::google_callback))
}
