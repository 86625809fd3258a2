use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::TokenPayload;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwkSet;

/// Checks signature, algorithm, audience, issuer and expiry against a key set.
#[derive(Clone)]
pub struct TokenVerifier {
    config: AuthConfig,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let issuer = config.issuer();
        Self { config, issuer }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Header, then key lookup, then signature, then claims; each stage has its own error.
    pub fn verify(&self, token: &str, keys: &JwkSet) -> AuthResult<TokenPayload> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;
        let (modulus, exponent) = match (jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(n), Some(e)) => (n, e),
            _ => {
                return Err(AuthError::InvalidToken(format!(
                    "key '{kid}' has no RSA components"
                )))
            }
        };
        let key = DecodingKey::from_rsa_components(modulus, exponent)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;

        let token_data =
            decode::<Map<String, Value>>(token, &key, &self.validation()).map_err(classify)?;
        debug!(kid, "verified JWT successfully");
        Ok(TokenPayload::new(token_data.claims))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.algorithms = self.config.algorithms.clone();
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        // Off by default in jsonwebtoken; a future `nbf` must be rejected.
        validation.validate_nbf = true;
        validation.leeway = self.config.leeway_seconds.into();
        validation
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims(err.to_string()),
        _ => AuthError::InvalidToken(err.to_string()),
    }
}
