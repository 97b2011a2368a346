//! Google signing-key cache
//!
//! Keys are fetched from the provider's JWKS endpoint and kept for a fixed
//! lifetime. A lookup for a `kid` that is not cached, or a lookup after the
//! lifetime has passed, refetches the whole set. Concurrent refetches are
//! harmless: the last write wins.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::google::GoogleError;
use crate::common::clock::Clock;

/// One RSA public key from a JWKS document
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, GoogleError>;
}

/// Fetches the key set over HTTP
pub struct HttpKeyFetcher {
    client: Client,
    certs_url: String,
}

impl HttpKeyFetcher {
    pub fn new(client: Client, certs_url: impl Into<String>) -> Self {
        Self {
            client,
            certs_url: certs_url.into(),
        }
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch_keys(&self) -> Result<Vec<Jwk>, GoogleError> {
        debug!(url = %self.certs_url, "Fetching Google signing keys");

        let response = self
            .client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Google certs endpoint returned an error");
            return Err(GoogleError::RequestFailed(format!("HTTP {} fetching keys", status)));
        }

        let set = response
            .json::<JwkSet>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;
        Ok(set.keys)
    }
}

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<DateTime<Utc>>,
}

pub struct KeyCache {
    fetcher: Arc<dyn KeyFetcher>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    cached: RwLock<CachedKeys>,
}

impl KeyCache {
    pub fn new(fetcher: Arc<dyn KeyFetcher>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            fetcher,
            clock,
            lifetime,
            cached: RwLock::new(CachedKeys::default()),
        }
    }

    /// Decoding key for `kid`, refetching the set when stale or when `kid` is unknown
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, GoogleError> {
        {
            let cached = self.cached.read().await;
            if self.is_fresh(&cached) {
                if let Some(key) = cached.keys.get(kid) {
                    return Ok(key.clone());
                }
                debug!(kid, "Signing key not cached, refetching");
            }
        }

        let keys = self.refresh().await?;
        keys.get(kid)
            .cloned()
            .ok_or_else(|| GoogleError::UnknownKey(kid.to_string()))
    }

    fn is_fresh(&self, cached: &CachedKeys) -> bool {
        match cached.fetched_at {
            Some(at) => self.clock.now() - at < self.lifetime,
            None => false,
        }
    }

    async fn refresh(&self) -> Result<HashMap<String, DecodingKey>, GoogleError> {
        let fetched = self.fetcher.fetch_keys().await?;

        let mut keys = HashMap::with_capacity(fetched.len());
        for jwk in fetched {
            if jwk.kty != "RSA" || jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
                debug!(kid = %jwk.kid, kty = %jwk.kty, "Skipping non-RS256 signing key");
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, error = %e, "Skipping unusable signing key"),
            }
        }

        info!(count = keys.len(), "Google signing keys refreshed");

        let mut cached = self.cached.write().await;
        cached.keys = keys.clone();
        cached.fetched_at = Some(self.clock.now());
        Ok(keys)
    }
}
