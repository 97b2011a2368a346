//! Signed, time-bound tokens
//!
//! Account tokens (access and refresh) and OAuth state tokens are signed with
//! different secrets, so a token of one family never verifies as the other.
//! Expiry is checked against the codec's [`Clock`] with zero leeway.

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::models::{Claims, StateClaims, TokenKind, TokenPair};
use crate::common::clock::Clock;
use crate::common::config::TokenSettings;
use crate::common::error::AuthError;

#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    account_encoding: EncodingKey,
    account_decoding: DecodingKey,
    state_encoding: EncodingKey,
    state_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    state_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            algorithm: settings.algorithm,
            account_encoding: EncodingKey::from_secret(settings.secret_key.as_bytes()),
            account_decoding: DecodingKey::from_secret(settings.secret_key.as_bytes()),
            state_encoding: EncodingKey::from_secret(settings.state_secret_key.as_bytes()),
            state_decoding: DecodingKey::from_secret(settings.state_secret_key.as_bytes()),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            state_ttl: settings.state_ttl,
            clock,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Current time in seconds since the epoch, as seen by this codec
    pub fn now_timestamp(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Sign an account token for `subject`
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims, &self.account_encoding)
    }

    pub fn issue_access(&self, subject: &str) -> Result<String, AuthError> {
        self.issue(subject, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<String, AuthError> {
        self.issue(subject, TokenKind::Refresh, self.refresh_ttl)
    }

    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject)?,
        })
    }

    /// Sign an OAuth state token with the state secret
    pub fn issue_state(&self, ttl: Duration) -> Result<String, AuthError> {
        let claims = StateClaims {
            exp: (self.clock.now() + ttl).timestamp(),
        };
        self.sign(&claims, &self.state_encoding)
    }

    /// Verify signature, then expiry, then kind
    pub fn parse(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims: Claims = self.verify(token, &self.account_decoding)?;
        self.check_expiry(claims.exp)?;
        if claims.kind != expected {
            debug!(expected = %expected, actual = %claims.kind, "Token kind mismatch");
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }

    pub fn parse_state(&self, token: &str) -> Result<StateClaims, AuthError> {
        let claims: StateClaims = self.verify(token, &self.state_decoding)?;
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T, key: &EncodingKey) -> Result<String, AuthError> {
        encode(&Header::new(self.algorithm), claims, key).map_err(|e| {
            error!(error = %e, "JWT encoding error");
            AuthError::Internal("jwt error".to_string())
        })
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked against the codec clock instead
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<T>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "JWT validation failed");
                match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        AuthError::BadSignature
                    }
                    ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::MalformedToken,
                }
            })
    }

    fn check_expiry(&self, exp: i64) -> Result<(), AuthError> {
        if self.now_timestamp() >= exp {
            return Err(AuthError::ExpiredToken);
        }
        Ok(())
    }
}
