//! Token-minting helpers for test suites. Enabled by the `test-helpers` feature.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

use crate::jwks::{Jwk, JwkSet};

/// An RSA signing identity that publishes its public half as a JWKS entry.
pub struct TestIssuer {
    pub kid: String,
    pub domain: String,
    pub audience: String,
    encoding: EncodingKey,
    modulus: String,
    exponent: String,
}

impl TestIssuer {
    pub fn new(kid: &str, domain: &str, audience: &str) -> Self {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");

        Self {
            kid: kid.to_string(),
            domain: domain.to_string(),
            audience: audience.to_string(),
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
            modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }

    pub fn jwk(&self) -> Jwk {
        Jwk {
            kid: Some(self.kid.clone()),
            kty: Some("RSA".to_string()),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(self.modulus.clone()),
            e: Some(self.exponent.clone()),
        }
    }

    pub fn key_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk()],
        }
    }

    /// The JSON document served at `/.well-known/jwks.json`.
    pub fn jwks_body(&self) -> Value {
        serde_json::to_value(self.key_set()).expect("jwks json")
    }

    /// Claims valid for ten minutes with the given permissions.
    pub fn claims(&self, permissions: &[&str]) -> Value {
        let now = Utc::now().timestamp();
        json!({
            "iss": format!("https://{}/", self.domain),
            "sub": "auth0|test-user",
            "aud": self.audience,
            "iat": now,
            "exp": now + 600,
            "permissions": permissions,
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_kid(claims, &self.kid)
    }

    pub fn sign_with_kid(&self, claims: &Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &self.encoding).expect("sign token")
    }

    /// `Bearer <token>` for a fresh token carrying `permissions`.
    pub fn bearer(&self, permissions: &[&str]) -> String {
        format!("Bearer {}", self.sign(&self.claims(permissions)))
    }
}
