pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod guards;
pub mod jwks;
pub mod permissions;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod verifier;

pub use claims::TokenPayload;
pub use config::AuthConfig;
pub use error::{AuthError, AuthErrorBody, AuthResult};
pub use extractors::{bearer_token, Authorized};
pub use gate::AuthGate;
pub use guards::{RequireAuth, RequireAuthLayer};
pub use jwks::{CachedJwks, Jwk, JwkSet, JwksFetcher, KeySource};
pub use permissions::{
    check_permission, PERM_DELETE_DRINKS, PERM_GET_DRINKS_DETAIL, PERM_PATCH_DRINKS,
    PERM_POST_DRINKS,
};
pub use verifier::TokenVerifier;
