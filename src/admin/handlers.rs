// src/admin/handlers.rs

use axum::extract::{Extension, Json, Path};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::guard::AdminGuard;
use super::models::*;
use crate::auth::password::hash_password;
use crate::common::error::AuthError;
use crate::common::{safe_email_log, ApiError, AppState, ValidationResult, Validator};
use crate::users::directory::{is_unique_violation, UserDirectory};
use crate::users::models::{NewAccount, RegisterRequest, UserResponse};
use crate::users::validators::{AccountValidator, MIN_PASSWORD_LENGTH};

/// GET /admin/users - List every account
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    _admin: AdminGuard,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let accounts = state.directory.list_accounts().await.map_err(|e| {
        error!(error = %e, "Database error fetching account list");
        ApiError::DatabaseError(e)
    })?;

    info!(account_count = accounts.len(), "Admin fetched account list");
    Ok(Json(accounts.into_iter().map(UserResponse::from).collect()))
}

/// POST /admin/users/create - Create a password account
pub async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    _admin: AdminGuard,
    Json(request): Json<AdminCreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Same rules as self-registration
    let payload = RegisterRequest {
        email: request.email.trim().to_string(),
        password: request.password,
        full_name: request.full_name,
    };
    AccountValidator.validate(&payload).into_result()?;

    let account = state
        .directory
        .create_account(NewAccount {
            hashed_password: Some(hash_password(&payload.password)?),
            email: payload.email,
            full_name: payload.full_name,
            is_verified: request.is_verified,
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
        "Admin created account"
    );
    Ok(Json(account.into()))
}

/// PATCH /admin/users/:id - Enable/disable an account or reset its password
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    _admin: AdminGuard,
    Path(user_id): Path<i64>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(password) = &request.new_password {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            let mut result = ValidationResult::new();
            result.add_error("new_password", "Password must be at least 8 characters");
            return Err(result.into());
        }
    }

    if state.directory.get_by_id(user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    if let Some(is_active) = request.is_active {
        state.directory.set_active(user_id, is_active).await?;
        info!(user_id, is_active, "Admin changed account status");
    }
    if let Some(password) = &request.new_password {
        let hash = hash_password(password)?;
        state.directory.update_password_hash(user_id, &hash).await?;
        info!(user_id, "Admin reset account password");
    }

    let account = state
        .directory
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(account.into()))
}

/// DELETE /admin/users/:id - Hard delete; the account's tasks go with it
pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    _admin: AdminGuard,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.directory.delete_account(user_id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(user_id, "Admin deleted account");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
