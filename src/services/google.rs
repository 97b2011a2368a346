// src/services/google.rs
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::jwks::{HttpKeyFetcher, KeyCache, KeyFetcher};
use crate::common::clock::Clock;
use crate::common::config::GoogleSettings;

const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google OAuth not configured")]
    NotConfigured,

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    #[error("Unknown signing key: {0}")]
    UnknownKey(String),
}

/// Token endpoint response; only the ID token is used to sign the user in
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
}

/// Claims of a verified Google ID token
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

pub struct GoogleService {
    settings: GoogleSettings,
    client: Client,
    keys: KeyCache,
}

impl GoogleService {
    pub fn new(settings: GoogleSettings, clock: Arc<dyn Clock>) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;
        let fetcher = Arc::new(HttpKeyFetcher::new(client.clone(), settings.certs_url.clone()));
        Ok(Self::with_key_fetcher(settings, client, fetcher, clock))
    }

    pub fn with_key_fetcher(
        settings: GoogleSettings,
        client: Client,
        fetcher: Arc<dyn KeyFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let keys = KeyCache::new(fetcher, clock, settings.key_cache_lifetime);
        Self {
            settings,
            client,
            keys,
        }
    }

    /// URL of Google's consent page carrying `state`
    pub fn authorization_url(&self, state: &str) -> String {
        let scope = ["openid", "email", "profile"].join(" ");
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline",
            self.settings.auth_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens. Not retried.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError> {
        if self.settings.client_id.is_empty() {
            return Err(GoogleError::NotConfigured);
        }

        let params = [
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let token_response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response)
    }

    /// Verify an ID token's signature, audience, issuer and expiry
    pub async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdClaims, GoogleError> {
        let header = decode_header(id_token)
            .map_err(|e| GoogleError::InvalidIdToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| GoogleError::InvalidIdToken("'kid' not found in token header".into()))?;

        let key = self.keys.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.settings.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleIdClaims>(id_token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired".to_string(),
                    ErrorKind::InvalidAudience => "audience mismatch".to_string(),
                    ErrorKind::InvalidIssuer => "issuer mismatch".to_string(),
                    ErrorKind::InvalidSignature => "signature mismatch".to_string(),
                    _ => e.to_string(),
                };
                GoogleError::InvalidIdToken(reason)
            })?;

        debug!(kid = %kid, "Google ID token verified");
        Ok(claims)
    }
}
