use std::future::Future;
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{instrument, warn};

use crate::claims::TokenPayload;
use crate::config::AuthConfig;
use crate::error::AuthResult;
use crate::extractors::bearer_token;
use crate::guards::RequireAuthLayer;
use crate::jwks::{CachedJwks, JwksFetcher, KeySource};
use crate::permissions::check_permission;
use crate::verifier::TokenVerifier;

/// Single entry point for protected operations: extract, fetch keys, verify, check permission.
///
/// Holds no per-request state, so one instance is shared by every request.
#[derive(Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
    keys: Arc<dyn KeySource>,
}

impl AuthGate {
    /// Builds the key source from config: a fresh fetch per request unless a cache TTL is set.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let fetcher = JwksFetcher::new(config.jwks_url(), config.jwks_timeout)?;
        let keys: Arc<dyn KeySource> = match config.jwks_cache_ttl {
            Some(ttl) => Arc::new(CachedJwks::new(fetcher, ttl)),
            None => Arc::new(fetcher),
        };
        Ok(Self::with_key_source(config, keys))
    }

    pub fn with_key_source(config: AuthConfig, keys: Arc<dyn KeySource>) -> Self {
        Self {
            verifier: TokenVerifier::new(config),
            keys,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        self.verifier.config()
    }

    #[instrument(skip_all, fields(permission = %permission))]
    pub async fn authorize(&self, headers: &HeaderMap, permission: &str) -> AuthResult<TokenPayload> {
        let outcome = self.decide(headers, permission).await;
        if let Err(err) = &outcome {
            warn!(code = err.code(), status = err.status().as_u16(), error = %err, "request rejected");
        }
        outcome
    }

    async fn decide(&self, headers: &HeaderMap, permission: &str) -> AuthResult<TokenPayload> {
        let token = bearer_token(headers)?;
        let keys = self.keys.key_set().await?;
        let payload = self.verifier.verify(&token, &keys)?;
        check_permission(permission, &payload)?;
        Ok(payload)
    }

    /// Runs `operation` with the verified payload, or returns the rejection without running it.
    pub async fn guard<F, Fut, T>(
        &self,
        headers: &HeaderMap,
        permission: &str,
        operation: F,
    ) -> AuthResult<T>
    where
        F: FnOnce(TokenPayload) -> Fut,
        Fut: Future<Output = T>,
    {
        let payload = self.authorize(headers, permission).await?;
        Ok(operation(payload).await)
    }

    /// Tower layer enforcing `permission` on every request of the wrapped route.
    pub fn require(&self, permission: &'static str) -> RequireAuthLayer {
        RequireAuthLayer::new(self.clone(), permission)
    }
}
