//! Refresh-token exchange with conditional rotation

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{RefreshOutcome, TokenKind};
use super::session::ensure_active;
use super::tokens::TokenCodec;
use crate::common::error::AuthError;
use crate::users::directory::UserDirectory;

/// A refresh token is replaced once less than a quarter of its lifetime remains.
pub fn should_rotate(remaining_secs: i64, ttl_secs: i64) -> bool {
    remaining_secs.saturating_mul(4) < ttl_secs
}

#[derive(Clone)]
pub struct TokenRefresher {
    directory: Arc<dyn UserDirectory>,
    codec: TokenCodec,
}

impl TokenRefresher {
    pub fn new(directory: Arc<dyn UserDirectory>, codec: TokenCodec) -> Self {
        Self { directory, codec }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, AuthError> {
        let claims = self.codec.parse(refresh_token, TokenKind::Refresh)?;

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            warn!(subject = %claims.sub, "Refresh token subject is not an account id");
            AuthError::MalformedToken
        })?;

        let account = self
            .directory
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id, "Refresh rejected: account no longer exists");
                AuthError::AccountNotFound
            })?;
        ensure_active(&account)?;

        let subject = account.id.to_string();
        let access_token = self.codec.issue_access(&subject)?;

        let remaining = claims.exp - self.codec.now_timestamp();
        let rotated = should_rotate(remaining, self.codec.refresh_ttl().num_seconds());
        let refresh_token = if rotated {
            debug!(user_id, remaining_secs = remaining, "Rotating refresh token");
            self.codec.issue_refresh(&subject)?
        } else {
            refresh_token.to_string()
        };

        info!(user_id, rotated, "Access token refreshed");

        Ok(RefreshOutcome {
            access_token,
            refresh_token,
            rotated,
        })
    }
}
