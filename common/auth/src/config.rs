use std::time::Duration;

use jsonwebtoken::Algorithm;

const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Runtime configuration for bearer-token authorization.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Issuer domain, e.g. `tenant.eu.auth0.com`. Drives both `iss` and the JWKS URL.
    pub domain: String,
    /// Expected audience claim (aud).
    pub audience: String,
    /// Signing algorithms accepted in the token header.
    pub algorithms: Vec<Algorithm>,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
    /// Upper bound for a single JWKS fetch.
    pub jwks_timeout: Duration,
    /// Reuse a fetched key set for this long. `None` fetches on every verification.
    pub jwks_cache_ttl: Option<Duration>,
    jwks_url: Option<String>,
}

impl AuthConfig {
    /// Construct config for an issuer domain with RS256 only, no leeway and a 5 second fetch timeout.
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            audience: audience.into(),
            algorithms: vec![Algorithm::RS256],
            leeway_seconds: 0,
            jwks_timeout: Duration::from_secs(5),
            jwks_cache_ttl: None,
            jwks_url: None,
        }
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    pub fn with_jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = Some(ttl);
        self
    }

    /// Point key discovery somewhere other than the issuer domain (private issuers, test servers).
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    /// Expected `iss` claim: `https://<domain>/`.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    pub fn jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) => url.clone(),
            None => format!("https://{}{JWKS_PATH}", self.domain),
        }
    }
}
