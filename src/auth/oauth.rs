//! Google sign-in: redirect initiation and callback completion
//!
//! No server-side state is kept between the two phases. The state token
//! issued in [`OAuthFlow::begin`] is self-signed with the state secret and
//! carries only its expiry.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::{GoogleCallbackParams, Session};
use super::session::{ExternalIdentity, SessionIssuer};
use super::tokens::TokenCodec;
use crate::common::error::AuthError;
use crate::services::google::{GoogleError, GoogleService};

pub const REASON_AUTH_FAILED: &str = "auth_failed";
pub const REASON_IDENTITY_FAILED: &str = "identity_verification_failed";
pub const REASON_ACCOUNT_DISABLED: &str = "account_disabled";

/// A failed callback, reduced to the reason shown on the failure redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthFailure {
    pub reason: String,
}

impl OAuthFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<AuthError> for OAuthFailure {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::OAuthStateInvalid => OAuthFailure::new(REASON_AUTH_FAILED),
            AuthError::OAuthExchangeFailed(detail) => OAuthFailure::new(detail),
            AuthError::IdentityVerificationFailed(_) => OAuthFailure::new(REASON_IDENTITY_FAILED),
            AuthError::AccountDisabled => OAuthFailure::new(REASON_ACCOUNT_DISABLED),
            other => {
                error!(error = %other, "Google sign-in failed after identity verification");
                OAuthFailure::new(REASON_AUTH_FAILED)
            }
        }
    }
}

#[derive(Clone)]
pub struct OAuthFlow {
    codec: TokenCodec,
    google: Arc<GoogleService>,
    sessions: SessionIssuer,
}

impl OAuthFlow {
    pub fn new(codec: TokenCodec, google: Arc<GoogleService>, sessions: SessionIssuer) -> Self {
        Self {
            codec,
            google,
            sessions,
        }
    }

    /// Issue a state token and return the provider URL to redirect to
    pub fn begin(&self) -> Result<String, AuthError> {
        let state = self.codec.issue_state(self.codec.state_ttl())?;
        Ok(self.google.authorization_url(&state))
    }

    /// Run the callback to completion; every failure becomes an [`OAuthFailure`]
    pub async fn complete(&self, params: &GoogleCallbackParams) -> Result<Session, OAuthFailure> {
        self.complete_inner(params).await.map_err(OAuthFailure::from)
    }

    async fn complete_inner(&self, params: &GoogleCallbackParams) -> Result<Session, AuthError> {
        let state = params.state.as_deref().unwrap_or_default();
        self.codec.parse_state(state).map_err(|e| {
            warn!(error = %e, "OAuth callback rejected: invalid state");
            AuthError::OAuthStateInvalid
        })?;

        if let Some(provider_error) = params.error.as_deref() {
            warn!(provider_error, "Google returned an error to the callback");
            return Err(AuthError::OAuthExchangeFailed(provider_error.to_string()));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::OAuthExchangeFailed("missing authorization code".into()))?;

        let tokens = self.google.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "Google code exchange failed");
            AuthError::OAuthExchangeFailed(e.to_string())
        })?;

        let id_token = tokens
            .id_token
            .ok_or_else(|| AuthError::OAuthExchangeFailed("token response has no id_token".into()))?;

        let claims = self
            .google
            .verify_id_token(&id_token)
            .await
            .map_err(identity_failure)?;

        // Accounts created here are marked verified, so the provider must vouch for the email
        if claims.email_verified == Some(false) {
            return Err(identity_failure(GoogleError::InvalidIdToken(
                "email not verified".into(),
            )));
        }

        let email = claims
            .email
            .ok_or_else(|| identity_failure(GoogleError::InvalidIdToken("missing email".into())))?;

        let session = self
            .sessions
            .login_with_identity(&ExternalIdentity {
                subject: claims.sub,
                email,
                name: claims.name,
                picture: claims.picture,
            })
            .await?;

        info!(user_id = session.account.id, provider = "google", "Google sign-in completed");
        Ok(session)
    }
}

fn identity_failure(err: GoogleError) -> AuthError {
    warn!(error = %err, "Google ID token verification failed");
    AuthError::IdentityVerificationFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::clock::ManualClock;
    use crate::common::config::{AppConfig, GoogleSettings};
    use crate::common::migrations::test_pool;
    use crate::services::testing::{
        id_token_claims, serve, sign_id_token, test_jwk, StaticKeyFetcher, TEST_KID,
    };
    use crate::users::directory::{SqliteUserDirectory, UserDirectory};
    use axum::{routing::post, Json, Router};
    use chrono::Duration;
    use reqwest::Client;
    use serde_json::json;

    struct Fixture {
        flow: OAuthFlow,
        codec: TokenCodec,
        clock: Arc<ManualClock>,
        directory: Arc<SqliteUserDirectory>,
    }

    /// Serve a fake token endpoint returning `id_token`, and return its URL
    async fn fake_token_endpoint(id_token: Option<String>) -> String {
        let app = Router::new().route(
            "/token",
            post(move || {
                let id_token = id_token.clone();
                async move {
                    Json(json!({
                        "access_token": "google-access-token",
                        "id_token": id_token,
                        "expires_in": 3599,
                        "token_type": "Bearer",
                    }))
                }
            }),
        );
        format!("{}/token", serve(app).await)
    }

    async fn fixture(token_url: String) -> Fixture {
        let config = AppConfig::for_tests();
        let clock = Arc::new(ManualClock::starting_now());
        let codec = TokenCodec::new(&config.tokens, clock.clone());
        let directory = Arc::new(SqliteUserDirectory::new(test_pool().await));
        let google = GoogleService::with_key_fetcher(
            GoogleSettings {
                token_url,
                ..config.google
            },
            Client::new(),
            Arc::new(StaticKeyFetcher::new(vec![test_jwk(TEST_KID)])),
            clock.clone(),
        );
        let sessions = SessionIssuer::new(directory.clone(), codec.clone());

        Fixture {
            flow: OAuthFlow::new(codec.clone(), Arc::new(google), sessions),
            codec,
            clock,
            directory,
        }
    }

    fn callback(code: &str, state: &str) -> GoogleCallbackParams {
        GoogleCallbackParams {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            error: None,
        }
    }

    fn client_id() -> String {
        AppConfig::for_tests().google.client_id
    }

    #[tokio::test]
    async fn test_begin_embeds_a_valid_state_token() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let url = f.flow.begin().unwrap();

        let state = url
            .split('&')
            .find_map(|p| p.strip_prefix("state="))
            .unwrap();
        assert!(f.codec.parse_state(state).is_ok());
    }

    #[tokio::test]
    async fn test_successful_callback_creates_account_and_session() {
        let id_token = sign_id_token(TEST_KID, &id_token_claims(&client_id(), "g-42", "g@example.com"));
        let f = fixture(fake_token_endpoint(Some(id_token)).await).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();

        let session = f.flow.complete(&callback("auth-code", &state)).await.unwrap();

        assert_eq!(session.account.email, "g@example.com");
        let account = f.directory.find_by_external_id("g-42").await.unwrap().unwrap();
        assert_eq!(account.id, session.account.id);
        assert!(account.last_login.is_some());
    }

    #[tokio::test]
    async fn test_state_signed_with_account_secret_fails_generically() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let forged = f.codec.issue_access("1").unwrap();

        let failure = f.flow.complete(&callback("auth-code", &forged)).await.unwrap_err();
        assert_eq!(failure.reason, REASON_AUTH_FAILED);
        assert!(f.directory.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_state_fails_generically() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();
        f.clock.advance(Duration::minutes(10));

        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert_eq!(failure.reason, REASON_AUTH_FAILED);
    }

    #[tokio::test]
    async fn test_missing_state_fails_generically() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let params = GoogleCallbackParams {
            code: Some("auth-code".into()),
            ..Default::default()
        };

        let failure = f.flow.complete(&params).await.unwrap_err();
        assert_eq!(failure.reason, REASON_AUTH_FAILED);
    }

    #[tokio::test]
    async fn test_provider_error_is_echoed() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();
        let params = GoogleCallbackParams {
            code: None,
            state: Some(state),
            error: Some("access_denied".into()),
        };

        let failure = f.flow.complete(&params).await.unwrap_err();
        assert_eq!(failure.reason, "access_denied");
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_exchange_failure() {
        let f = fixture("http://127.0.0.1:9/token".into()).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();

        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert!(failure.reason.starts_with("HTTP request failed"), "{}", failure.reason);
    }

    #[tokio::test]
    async fn test_id_token_for_other_client_fails_verification() {
        let id_token = sign_id_token(
            TEST_KID,
            &id_token_claims("other.apps.googleusercontent.com", "g-42", "g@example.com"),
        );
        let f = fixture(fake_token_endpoint(Some(id_token)).await).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();

        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert_eq!(failure.reason, REASON_IDENTITY_FAILED);
        assert!(f.directory.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unverified_email_fails_verification() {
        let mut claims = id_token_claims(&client_id(), "g-9", "g9@example.com");
        claims["email_verified"] = false.into();
        let id_token = sign_id_token(TEST_KID, &claims);
        let f = fixture(fake_token_endpoint(Some(id_token)).await).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();

        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert_eq!(failure.reason, REASON_IDENTITY_FAILED);
        assert!(f.directory.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_token_endpoint_times_out_as_exchange_failure() {
        let app = Router::new().route(
            "/token",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Json(json!({ "access_token": "too-late" }))
            }),
        );
        let config = AppConfig::for_tests();
        let settings = GoogleSettings {
            token_url: format!("{}/token", serve(app).await),
            http_timeout: std::time::Duration::from_millis(200),
            ..config.google
        };
        let clock = Arc::new(ManualClock::starting_now());
        let codec = TokenCodec::new(&config.tokens, clock.clone());
        let directory = Arc::new(SqliteUserDirectory::new(test_pool().await));
        let google = GoogleService::new(settings, clock).unwrap();
        let flow = OAuthFlow::new(
            codec.clone(),
            Arc::new(google),
            SessionIssuer::new(directory.clone(), codec.clone()),
        );

        let state = codec.issue_state(codec.state_ttl()).unwrap();
        let started = std::time::Instant::now();
        let failure = flow.complete(&callback("auth-code", &state)).await.unwrap_err();

        assert!(failure.reason.starts_with("HTTP request failed"), "{}", failure.reason);
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
        assert!(directory.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_token_is_exchange_failure() {
        let f = fixture(fake_token_endpoint(None).await).await;
        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();

        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert_eq!(failure.reason, "token response has no id_token");
    }

    #[tokio::test]
    async fn test_disabled_account_gets_its_own_reason() {
        let id_token = sign_id_token(TEST_KID, &id_token_claims(&client_id(), "g-7", "g7@example.com"));
        let f = fixture(fake_token_endpoint(Some(id_token)).await).await;

        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();
        let session = f.flow.complete(&callback("auth-code", &state)).await.unwrap();
        f.directory.set_active(session.account.id, false).await.unwrap();

        let state = f.codec.issue_state(f.codec.state_ttl()).unwrap();
        let failure = f.flow.complete(&callback("auth-code", &state)).await.unwrap_err();
        assert_eq!(failure.reason, REASON_ACCOUNT_DISABLED);
    }
}
