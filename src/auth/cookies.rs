//! Session cookies for web clients
//!
//! Access and refresh tokens travel in HttpOnly cookies. The CSRF cookie is
//! readable by scripts so the client can echo it in `X-CSRF-Token`.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use tracing::error;

use super::models::TokenPair;
use super::tokens::TokenCodec;
use crate::common::ApiError;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

const REFRESH_COOKIE_PATH: &str = "/auth/refresh-token";
const CSRF_MAX_AGE_SECS: i64 = 86_400;

fn cookie(
    name: &str,
    value: &str,
    path: &str,
    max_age: i64,
    http_only: bool,
    same_site: &str,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path={path}; SameSite={same_site}; Max-Age={max_age}");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn access_cookie(token: &str, max_age: i64, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(ACCESS_COOKIE, token, "/", max_age, true, "Lax", secure)
}

pub fn refresh_cookie(token: &str, max_age: i64, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(REFRESH_COOKIE, token, REFRESH_COOKIE_PATH, max_age, true, "Lax", secure)
}

pub fn csrf_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(CSRF_COOKIE, token, "/", CSRF_MAX_AGE_SECS, false, "Strict", secure)
}

/// Random double-submit token
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Set-Cookie headers for a freshly issued token pair plus a new CSRF token
pub fn session_cookies(codec: &TokenCodec, tokens: &TokenPair, secure: bool) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let values = [
        access_cookie(&tokens.access_token, codec.access_ttl().num_seconds(), secure),
        refresh_cookie(&tokens.refresh_token, codec.refresh_ttl().num_seconds(), secure),
        csrf_cookie(&generate_csrf_token(), secure),
    ];
    for value in values {
        headers.append(SET_COOKIE, value.map_err(cookie_error)?);
    }
    Ok(headers)
}

/// Set-Cookie headers that expire all session cookies
pub fn clear_session_cookies(secure: bool) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let values = [
        access_cookie("", 0, secure),
        refresh_cookie("", 0, secure),
        cookie(CSRF_COOKIE, "", "/", 0, false, "Strict", secure),
    ];
    for value in values {
        headers.append(SET_COOKIE, value.map_err(cookie_error)?);
    }
    Ok(headers)
}

fn cookie_error(e: InvalidHeaderValue) -> ApiError {
    error!(error = %e, "Failed to build Set-Cookie header");
    ApiError::InternalServer("Failed to set session cookies".to_string())
}

/// Value of cookie `name` from the request's Cookie header
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else { continue };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().unwrap_or_default().trim();
            let val = parts.next().unwrap_or_default().trim();
            if key == name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}
