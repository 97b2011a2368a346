//! Account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account database model
#[derive(FromRow, Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub hashed_password: Option<String>,
    pub full_name: Option<String>,
    pub google_id: Option<String>,
    pub picture: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields needed to create an account; at least one credential must be set
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub email: String,
    pub google_id: Option<String>,
    pub hashed_password: Option<String>,
    pub full_name: Option<String>,
    pub picture: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
}

/// Account as returned by the API; never carries credentials
#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub picture: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            full_name: account.full_name,
            picture: account.picture,
            is_verified: account.is_verified,
            is_active: account.is_active,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct PictureUpdateRequest {
    pub picture: String,
}
