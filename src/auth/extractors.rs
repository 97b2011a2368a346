//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::cookies::{read_cookie, ACCESS_COOKIE, CSRF_COOKIE, CSRF_HEADER};
use super::models::{Claims, TokenKind};
use super::session::ensure_active;
use crate::common::error::AuthError;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::users::directory::UserDirectory;
use crate::users::models::Account;

/// Authenticated user extractor
///
/// Accepts an access token from `Authorization: Bearer` or from the
/// `access_token` cookie. Cookie-borne tokens on state-changing requests must
/// be accompanied by an `X-CSRF-Token` header matching the `csrf_token` cookie.
#[derive(Debug)]
pub struct AuthedUser {
    pub account: Account,
    pub claims: Claims,
}

impl AuthedUser {
    pub fn id(&self) -> i64 {
        self.account.id
    }
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn check_csrf(headers: &HeaderMap) -> Result<(), ApiError> {
    let cookie = read_cookie(headers, CSRF_COOKIE);
    let header = headers
        .get(CSRF_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim);

    match (cookie.as_deref(), header) {
        (Some(cookie), Some(header)) if cookie == header => Ok(()),
        _ => {
            warn!("CSRF check failed for cookie-authenticated request");
            Err(ApiError::Forbidden("CSRF token missing or invalid".into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let token = match bearer_token(&parts.headers) {
            Some(token) => token,
            None => {
                let token = read_cookie(&parts.headers, ACCESS_COOKIE).ok_or_else(|| {
                    debug!("Authentication failed: no bearer token or access cookie");
                    ApiError::Unauthorized("Not authenticated".into())
                })?;
                if !is_safe_method(&parts.method) {
                    check_csrf(&parts.headers)?;
                }
                token
            }
        };

        let claims = app_state.codec.parse(&token, TokenKind::Access)?;

        let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::MalformedToken)?;
        let account = app_state
            .directory
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id, "Authentication failed: user not found in database");
                AuthError::AccountNotFound
            })?;
        ensure_active(&account)?;

        debug!(
            user_id = account.id,
            email = %safe_email_log(&account.email),
            "User authentication successful via extractor"
        );

        Ok(AuthedUser { account, claims })
    }
}
