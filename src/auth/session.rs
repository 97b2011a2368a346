//! Login orchestration: account lookup, status checks, token issuance

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{AccountSummary, Session};
use super::password::verify_password;
use super::tokens::TokenCodec;
use crate::common::error::AuthError;
use crate::common::safe_email_log;
use crate::users::directory::{is_unique_violation, UserDirectory};
use crate::users::models::{Account, NewAccount};

/// Identity asserted by a verified third-party ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct SessionIssuer {
    directory: Arc<dyn UserDirectory>,
    codec: TokenCodec,
}

impl SessionIssuer {
    pub fn new(directory: Arc<dyn UserDirectory>, codec: TokenCodec) -> Self {
        Self { directory, codec }
    }

    /// Email/password login. The active check runs before the password check.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = match self.directory.find_by_email(email).await? {
            Some(account) => account,
            None => {
                warn!(email = %safe_email_log(email), "Login failed: no account for email");
                return Err(AuthError::AccountNotFound);
            }
        };

        ensure_active(&account)?;

        let Some(hash) = account.hashed_password.as_deref() else {
            warn!(user_id = account.id, "Login failed: account has no password set");
            return Err(AuthError::BadCredentials);
        };
        if !verify_password(password, hash) {
            warn!(user_id = account.id, "Login failed: incorrect password");
            return Err(AuthError::BadCredentials);
        }

        self.start_session(account).await
    }

    /// Login through a verified external identity, creating the account on first use
    pub async fn login_with_identity(&self, identity: &ExternalIdentity) -> Result<Session, AuthError> {
        let account = match self.directory.find_by_external_id(&identity.subject).await? {
            Some(account) => {
                debug!(user_id = account.id, provider = "google", "Found existing account");
                account
            }
            None => {
                info!(
                    email = %safe_email_log(&identity.email),
                    provider = "google",
                    "Creating new account via Google OAuth"
                );
                self.directory
                    .create_account(NewAccount {
                        email: identity.email.clone(),
                        google_id: Some(identity.subject.clone()),
                        hashed_password: None,
                        full_name: identity.name.clone(),
                        picture: identity.picture.clone(),
                        is_verified: true,
                        is_active: true,
                    })
                    .await
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            AuthError::EmailAlreadyRegistered
                        } else {
                            AuthError::Directory(e)
                        }
                    })?
            }
        };

        ensure_active(&account)?;
        self.start_session(account).await
    }

    async fn start_session(&self, account: Account) -> Result<Session, AuthError> {
        // Tokens are only minted once the last_login write has committed
        let account = self.directory.update_last_login(&account).await?;
        let tokens = self.codec.issue_pair(&account.id.to_string())?;

        info!(
            user_id = account.id,
            email = %safe_email_log(&account.email),
            "Session issued"
        );

        Ok(Session {
            tokens,
            account: AccountSummary::from(&account),
        })
    }
}

pub fn ensure_active(account: &Account) -> Result<(), AuthError> {
    if !account.is_active {
        warn!(user_id = account.id, "Rejected request for disabled account");
        return Err(AuthError::AccountDisabled);
    }
    Ok(())
}
