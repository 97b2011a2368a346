// src/users/validators.rs

use regex::Regex;

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Basic email shape check
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn check_password(result: &mut ValidationResult, field: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        result.add_error(field, "Password must be at least 8 characters");
    } else if password.len() > 128 {
        result.add_error(field, "Password must be less than 128 characters");
    }
}

fn check_full_name(result: &mut ValidationResult, full_name: Option<&str>) {
    if let Some(name) = full_name {
        if name.len() > 255 {
            result.add_error("full_name", "Full name must be less than 255 characters");
        }
    }
}

// ============================================================================
// Account Validators
// ============================================================================

pub struct AccountValidator;

impl Validator<RegisterRequest> for AccountValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !valid_email(data.email.trim()) {
            result.add_error("email", "A valid email address is required");
        }
        check_password(&mut result, "password", &data.password);
        check_full_name(&mut result, data.full_name.as_deref());

        result
    }
}

impl Validator<UpdateProfileRequest> for AccountValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_full_name(&mut result, data.full_name.as_deref());
        result
    }
}

impl Validator<ChangePasswordRequest> for AccountValidator {
    fn validate(&self, data: &ChangePasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.current_password.is_empty() {
            result.add_error("current_password", "Current password is required");
        }
        check_password(&mut result, "new_password", &data.new_password);

        result
    }
}

impl Validator<PictureUpdateRequest> for AccountValidator {
    fn validate(&self, data: &PictureUpdateRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Pictures are stored inline as data URLs
        if !data.picture.starts_with("data:image/") {
            result.add_error("picture", "Invalid Base64 image format");
        }

        result
    }
}
