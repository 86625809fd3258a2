use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way a request can fail authorization. All variants are terminal for the request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no signing key published for kid '{0}'")]
    UnknownKeyId(String),
    #[error("unable to parse or verify token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    #[error("token has no permissions claim")]
    MissingPermissions,
    #[error("token lacks permission '{0}'")]
    InsufficientPermission(String),
    #[error("handler reads the verified payload but the route has no auth layer")]
    MissingAuthLayer,
}

impl AuthError {
    /// Stable machine-readable code rendered to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "authorization_header_missing",
            AuthError::InvalidAuthorization => "malformed_header",
            AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::MissingKeyId
            | AuthError::UnknownKeyId(_)
            | AuthError::InvalidToken(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::MissingPermissions => "missing_permissions",
            AuthError::InsufficientPermission(_) => "insufficient_permission",
            AuthError::MissingAuthLayer => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAuthorization
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::UnknownKeyId(_)
            | AuthError::InvalidToken(_)
            | AuthError::MissingPermissions => StatusCode::BAD_REQUEST,
            AuthError::InsufficientPermission(_) => StatusCode::FORBIDDEN,
            AuthError::MissingAuthLayer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing description. Never includes key material or library error text.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "Authorization header is expected.",
            AuthError::InvalidAuthorization => {
                "Authorization header must be of the form 'Bearer <token>'."
            }
            AuthError::JwksFetch(_) | AuthError::JwksDecode(_) => {
                "Unable to retrieve the signing keys."
            }
            AuthError::MissingKeyId => "Authorization malformed.",
            AuthError::UnknownKeyId(_) => "Unable to find the appropriate key.",
            AuthError::InvalidToken(_) => "Unable to parse authentication token.",
            AuthError::TokenExpired => "Token expired.",
            AuthError::InvalidClaims(_) => {
                "Incorrect claims. Please, check the audience and issuer."
            }
            AuthError::MissingPermissions => "Permissions not included in token.",
            AuthError::InsufficientPermission(_) => "Permission not found.",
            AuthError::MissingAuthLayer => "Internal server error.",
        }
    }

    pub fn body(&self) -> AuthErrorBody {
        AuthErrorBody {
            success: false,
            error: self.status().as_u16(),
            code: self.code(),
            description: self.description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthErrorBody {
    pub success: bool,
    pub error: u16,
    pub code: &'static str,
    pub description: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let mut resp = (status, Json(self.body())).into_response();
        resp.headers_mut()
            .insert("X-Error-Code", HeaderValue::from_static(code));
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn status_and_code_per_variant() {
        let cases = [
            (AuthError::MissingAuthorization, 401, "authorization_header_missing"),
            (AuthError::InvalidAuthorization, 400, "malformed_header"),
            (AuthError::JwksFetch("down".into()), 400, "invalid_header"),
            (AuthError::MissingKeyId, 401, "invalid_header"),
            (AuthError::UnknownKeyId("k".into()), 400, "invalid_header"),
            (AuthError::InvalidToken("bad".into()), 400, "invalid_header"),
            (AuthError::TokenExpired, 401, "token_expired"),
            (AuthError::InvalidClaims("aud".into()), 401, "invalid_claims"),
            (AuthError::MissingPermissions, 400, "missing_permissions"),
            (
                AuthError::InsufficientPermission("post:drinks".into()),
                403,
                "insufficient_permission",
            ),
            (AuthError::MissingAuthLayer, 500, "internal_error"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
            assert_eq!(err.code(), code, "{err:?}");
        }
    }

    #[tokio::test]
    async fn renders_json_body_and_error_header() {
        let resp = AuthError::InsufficientPermission("patch:drinks".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            resp.headers().get("X-Error-Code").unwrap(),
            "insufficient_permission"
        );
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 403);
        assert_eq!(body["code"], "insufficient_permission");
        assert_eq!(body["description"], "Permission not found.");
    }

    #[test]
    fn description_hides_internal_detail() {
        let err = AuthError::JwksFetch("connect error at 10.0.0.7".into());
        assert!(!err.description().contains("10.0.0.7"));
        assert!(err.to_string().contains("10.0.0.7"));
    }
}
