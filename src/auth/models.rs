//! Authentication data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::users::models::Account;

/// Kind tag carried inside every signed account token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            _ => Err(()),
        }
    }
}

/// JWT claims for access and refresh tokens
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims of the OAuth state token: an expiry and nothing else
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StateClaims {
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Public projection of an account returned alongside tokens
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            full_name: account.full_name.clone(),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: TokenPair,
    pub account: AccountSummary,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub rotated: bool,
}

/// OAuth2 password-grant form body
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: AccountSummary,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub rotated: bool,
}

#[derive(Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub token_type: TokenKind,
    pub expires_in: i64,
}

/// Query string Google appends to the callback redirect
#[derive(Deserialize, Debug, Default)]
pub struct GoogleCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
