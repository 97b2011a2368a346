//! Shared-secret guard for the admin API

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tracing::warn;

use crate::common::{ApiError, AppState};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Present only when `X-Admin-Token` matches the configured `ADMIN_TOKEN`.
/// With no token configured every admin request is refused.
#[derive(Debug)]
pub struct AdminGuard;

#[async_trait]
impl<S> FromRequestParts<S> for AdminGuard
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let Some(expected) = app_state.config.admin_token.as_deref().filter(|t| !t.is_empty())
        else {
            warn!("Admin request refused: ADMIN_TOKEN not configured");
            return Err(ApiError::Forbidden("Admin API disabled".into()));
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(token) if token == expected => Ok(AdminGuard),
            _ => {
                warn!(path = %parts.uri.path(), "Admin request refused: bad admin token");
                Err(ApiError::Forbidden("Invalid admin token".into()))
            }
        }
    }
}
