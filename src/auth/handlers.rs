//! Authentication handlers

use axum::{
    extract::{Extension, Form, Json, Query},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cookies::{
    access_cookie, clear_session_cookies, read_cookie, refresh_cookie, session_cookies,
    REFRESH_COOKIE,
};
use super::extractors::{bearer_token, AuthedUser};
use super::models::{
    GoogleCallbackParams, LoginForm, LoginResponse, RefreshResponse, TokenKind,
    ValidateTokenResponse,
};
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState};

const TOKEN_TYPE_HEADER: &str = "x-token-type";

/// POST /auth/token
/// Password login using an OAuth2 password-grant form (`username`, `password`)
///
/// # Response
/// ```json
/// {
///   "access_token": "...",
///   "refresh_token": "...",
///   "token_type": "bearer",
///   "expires_in": 1800,
///   "user": { "id": 1, "email": "...", "full_name": "..." }
/// }
/// ```
/// The tokens are also set as cookies together with a fresh CSRF token.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    debug!(email = %safe_email_log(&form.username), "Password login attempt");

    let session = state
        .sessions
        .login_with_password(form.username.trim(), &form.password)
        .await?;

    let headers = session_cookies(&state.codec, &session.tokens, state.secure_cookies())?;

    Ok((
        headers,
        Json(LoginResponse {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            token_type: "bearer",
            expires_in: state.codec.access_ttl().num_seconds(),
            user: session.account,
        }),
    ))
}

/// POST /auth/refresh-token
/// Exchange a refresh token (bearer or `refresh_token` cookie) for a new access token
///
/// The refresh token is only replaced when it is close to expiry; `rotated`
/// tells the client whether it changed.
pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<RefreshResponse>), ApiError> {
    let token = bearer_token(&headers)
        .or_else(|| read_cookie(&headers, REFRESH_COOKIE))
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".into()))?;

    debug!(token = %safe_token_log(&token), "Refresh requested");
    let outcome = state.refresher.refresh(&token).await?;

    let secure = state.secure_cookies();
    let mut cookies = HeaderMap::new();
    let access = access_cookie(&outcome.access_token, state.codec.access_ttl().num_seconds(), secure);
    let refresh = outcome.rotated.then(|| {
        refresh_cookie(&outcome.refresh_token, state.codec.refresh_ttl().num_seconds(), secure)
    });
    for value in std::iter::once(access).chain(refresh) {
        let value = value.map_err(|e| {
            error!(error = %e, "Failed to build Set-Cookie header");
            ApiError::InternalServer("Failed to set session cookies".into())
        })?;
        cookies.append(SET_COOKIE, value);
    }

    Ok((
        cookies,
        Json(RefreshResponse {
            access_token: outcome.access_token,
            refresh_token: outcome.refresh_token,
            token_type: "bearer",
            expires_in: state.codec.access_ttl().num_seconds(),
            rotated: outcome.rotated,
        }),
    ))
}

/// POST /auth/validate-token
/// Check a bearer token against the kind named in `X-Token-Type` (default `access`)
///
/// # Response
/// ```json
/// { "valid": true, "user_id": "1", "token_type": "access", "expires_in": 1799 }
/// ```
pub async fn validate_token(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ValidateTokenResponse>, ApiError> {
    let expected = match headers.get(TOKEN_TYPE_HEADER) {
        None => TokenKind::Access,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.parse::<TokenKind>().ok())
            .ok_or_else(|| ApiError::BadRequest("X-Token-Type must be 'access' or 'refresh'".into()))?,
    };

    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Bearer token missing".into()))?;
    let claims = state.codec.parse(&token, expected)?;

    Ok(Json(ValidateTokenResponse {
        valid: true,
        user_id: claims.sub,
        token_type: claims.kind,
        expires_in: claims.exp - state.codec.now_timestamp(),
    }))
}

/// GET /auth/protected
/// Smoke-test endpoint for clients holding an access token
pub async fn protected(authed: AuthedUser) -> Json<serde_json::Value> {
    let expires_at = Utc
        .timestamp_opt(authed.claims.exp, 0)
        .single()
        .map(|t| t.to_rfc3339());

    Json(json!({
        "message": "Access granted",
        "user_id": authed.id(),
        "token_info": {
            "type": authed.claims.kind,
            "expires_at": expires_at,
        },
    }))
}

/// POST /auth/logout
/// Clears the session cookies. Issued tokens stay valid until they expire.
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<(HeaderMap, Json<serde_json::Value>), ApiError> {
    let headers = clear_session_cookies(state.secure_cookies())?;
    info!("User logout successful");
    Ok((headers, Json(json!({ "message": "Logout successful" }))))
}

/// GET /auth/google/login - Start Google OAuth flow
pub async fn google_login(Extension(state): Extension<Arc<AppState>>) -> Result<Response, ApiError> {
    let auth_url = state.oauth.begin()?;
    info!("Redirecting to Google OAuth");
    Ok(redirect(&auth_url, HeaderMap::new()))
}

/// GET /auth/google/callback - Handle OAuth callback from Google
///
/// Always answers with a redirect: to the success URL with session cookies,
/// or to the failure URL with `?error=<reason>`.
pub async fn google_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<GoogleCallbackParams>,
) -> Response {
    let failure_url = |reason: &str| with_error_param(&state.config.frontend_failure_url, reason);

    match state.oauth.complete(&params).await {
        Ok(session) => match session_cookies(&state.codec, &session.tokens, state.secure_cookies()) {
            Ok(cookies) => redirect(&state.config.frontend_success_url, cookies),
            Err(_) => redirect(&failure_url("auth_failed"), HeaderMap::new()),
        },
        Err(failure) => {
            warn!(reason = %failure.reason, "Google sign-in failed");
            redirect(&failure_url(&failure.reason), HeaderMap::new())
        }
    }
}

/// Append `error=<reason>` to a URL that may already carry a query string
pub fn with_error_param(base: &str, reason: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}error={}", base, separator, urlencoding::encode(reason))
}

fn redirect(location: &str, mut headers: HeaderMap) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|e| {
        // Frontend URLs are checked at start-up; fall back to the site root
        error!(error = %e, "Redirect target is not a valid header value");
        HeaderValue::from_static("/")
    });
    headers.insert(LOCATION, value);
    (StatusCode::FOUND, headers).into_response()
}
