use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use common_auth::AuthConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_DATABASE_URL: &str = "sqlite://drinks.db?mode=rwc";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub auth: AuthConfig,
    pub database_url: String,
    pub reset_on_start: bool,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub host: IpAddr,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = lookup("AUTH0_DOMAIN")
            .and_then(|v| normalize_optional(&v))
            .context("AUTH0_DOMAIN must be set")?;
        let audience = lookup("API_AUDIENCE")
            .and_then(|v| normalize_optional(&v))
            .context("API_AUDIENCE must be set")?;

        let mut auth = AuthConfig::new(domain, audience);
        if let Some(leeway) = parse_number::<u32>(&lookup, "JWT_LEEWAY_SECONDS")? {
            auth = auth.with_leeway(leeway);
        }
        if let Some(secs) = parse_number::<u64>(&lookup, "JWKS_TIMEOUT_SECONDS")? {
            auth = auth.with_jwks_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_number::<u64>(&lookup, "JWKS_CACHE_TTL_SECONDS")? {
            if secs > 0 {
                auth = auth.with_jwks_cache_ttl(Duration::from_secs(secs));
            }
        }
        if let Some(url) = lookup("JWT_JWKS_URL").and_then(|v| normalize_optional(&v)) {
            auth = auth.with_jwks_url(url);
        }

        let database_url = lookup("DATABASE_URL")
            .and_then(|v| normalize_optional(&v))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let reset_on_start = lookup("DRINKS_RESET_ON_START")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origin_list(&v))
            .unwrap_or_default();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host: IpAddr = host
            .trim()
            .parse()
            .with_context(|| format!("Invalid HOST '{host}'"))?;
        let port = parse_number::<u16>(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);

        Ok(Self {
            auth,
            database_url,
            reset_on_start,
            cors_allowed_origins,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn cors_layer(&self) -> Result<CorsLayer> {
        let origin = if self.cors_allowed_origins.is_empty() {
            AllowOrigin::any()
        } else {
            let origins = self
                .cors_allowed_origins
                .iter()
                .map(|o| {
                    HeaderValue::from_str(o).map_err(|err| anyhow!("Invalid CORS origin '{o}': {err}"))
                })
                .collect::<Result<Vec<_>>>()?;
            AllowOrigin::list(origins)
        };
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
    }
}

fn parse_number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key).and_then(|v| normalize_optional(&v)) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|err| anyhow!("Failed to parse {key}='{raw}': {err}"))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_origin_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(normalize_optional)
        .filter(|origin| origin != "*")
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
