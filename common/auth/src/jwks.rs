use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};

/// One entry of a published key set. Entries without a `kid` are kept but never matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Linear scan by key id. When the set repeats a kid the last entry wins.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        let mut matches = self.keys.iter().filter(|key| key.kid.as_deref() == Some(kid));
        let first = matches.next()?;
        match matches.last() {
            Some(last) => {
                warn!(kid, "JWKS publishes duplicate kid; using the last entry");
                Some(last)
            }
            None => Some(first),
        }
    }
}

/// Where the verifier gets signing keys from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn key_set(&self) -> AuthResult<JwkSet>;
}

/// Fetches the issuer's key set over HTTP on every call.
#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    /// Builds a client bounded by `timeout`. Fails rather than falling back to an unbounded client.
    pub fn new(url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::JwksFetch(format!("failed to build JWKS client: {err}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn fetch(&self) -> AuthResult<JwkSet> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;
        debug!(count = set.keys.len(), jwks_url = %self.url, "Fetched JWKS");
        Ok(set)
    }
}

#[async_trait]
impl KeySource for JwksFetcher {
    async fn key_set(&self) -> AuthResult<JwkSet> {
        self.fetch().await
    }
}

struct CachedSet {
    keys: JwkSet,
    expires_at: Instant,
}

/// Keeps a fetched key set for a fixed TTL. Failed fetches are not cached.
pub struct CachedJwks {
    fetcher: JwksFetcher,
    ttl: Duration,
    cache: Arc<RwLock<Option<CachedSet>>>,
}

impl CachedJwks {
    pub fn new(fetcher: JwksFetcher, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

#[async_trait]
impl KeySource for CachedJwks {
    async fn key_set(&self) -> AuthResult<JwkSet> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let keys = self.fetcher.fetch().await?;
        *self.cache.write().await = Some(CachedSet {
            keys: keys.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(keys)
    }
}
