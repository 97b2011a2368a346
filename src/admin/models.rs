// src/admin/models.rs

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct AdminCreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Admin changes to an account; absent fields are left untouched
#[derive(Deserialize, Debug, Default)]
pub struct AdminUpdateUserRequest {
    pub is_active: Option<bool>,
    pub new_password: Option<String>,
}
