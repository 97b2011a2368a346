//! Account handlers: registration and self-service profile management

use axum::extract::{Extension, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::directory::{is_unique_violation, UserDirectory};
use super::models::*;
use super::validators::AccountValidator;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthedUser;
use crate::common::error::AuthError;
use crate::common::{safe_email_log, ApiError, AppState, Validator};

/// POST /users/register
/// Create an account with email and password
///
/// # Request Body
/// ```json
/// { "email": "pat@example.com", "password": "...", "full_name": "Pat" }
/// ```
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    AccountValidator.validate(&payload).into_result()?;

    let email = payload.email.trim().to_string();
    if state.directory.find_by_email(&email).await?.is_some() {
        warn!(email = %safe_email_log(&email), "Registration rejected: email already registered");
        return Err(AuthError::EmailAlreadyRegistered.into());
    }

    let account = state
        .directory
        .create_account(NewAccount {
            email,
            hashed_password: Some(hash_password(&payload.password)?),
            full_name: payload.full_name,
            is_active: true,
            ..Default::default()
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::from(AuthError::EmailAlreadyRegistered)
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

    info!(
        user_id = account.id,
        email = %safe_email_log(&account.email),
        "Account registered"
    );
    Ok(Json(account.into()))
}

/// GET /users/profile-details
pub async fn profile_details(authed: AuthedUser) -> Json<UserResponse> {
    Json(authed.account.into())
}

/// PATCH /users/profile-update
pub async fn update_profile(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    AccountValidator.validate(&payload).into_result()?;

    let account = state
        .directory
        .update_full_name(authed.id(), payload.full_name.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(account.into()))
}

/// POST /users/change-password
/// Requires the current password; OAuth-only accounts have none and are refused
pub async fn change_password(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    AccountValidator.validate(&payload).into_result()?;

    let current_ok = authed
        .account
        .hashed_password
        .as_deref()
        .is_some_and(|hash| verify_password(&payload.current_password, hash));
    if !current_ok {
        warn!(user_id = authed.id(), "Password change rejected: current password incorrect");
        return Err(ApiError::BadRequest("Current password is incorrect".into()));
    }

    let new_hash = hash_password(&payload.new_password)?;
    if !state.directory.update_password_hash(authed.id(), &new_hash).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(user_id = authed.id(), "Password changed");
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// POST /users/upload-picture
/// Store a `data:image/...` URL as the profile picture
pub async fn upload_picture(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    Json(payload): Json<PictureUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    AccountValidator.validate(&payload).into_result()?;

    let account = state
        .directory
        .update_picture(authed.id(), &payload.picture)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(account.into()))
}
