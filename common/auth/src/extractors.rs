use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::claims::TokenPayload;
use crate::error::{AuthError, AuthResult};

const BEARER_SCHEME: &str = "Bearer";

/// Pulls the bearer token out of the `Authorization` header, verbatim.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    if value.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }

    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?;

    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) => Ok(token.to_owned()),
        _ => Err(AuthError::InvalidAuthorization),
    }
}

/// Verified payload placed in the request by [`crate::RequireAuthLayer`].
///
/// Extracting it from a route without the layer is a wiring error: the
/// request is rejected with a 500 instead of running the handler unauthenticated.
#[derive(Debug, Clone)]
pub struct Authorized(pub TokenPayload);

#[async_trait]
impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenPayload>()
            .cloned()
            .map(Authorized)
            .ok_or(AuthError::MissingAuthLayer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_static(value));
        map
    }

    #[test]
    fn accepts_bearer_token() {
        let token = bearer_token(&headers("Bearer abc.def.ghi")).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let token = bearer_token(&headers("  Bearer   abc.def.ghi ")).expect("token");
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn missing_or_empty_header_is_unauthorized() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthorization));
        assert_eq!(err.status().as_u16(), 401);

        let err = bearer_token(&headers("")).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthorization));
    }

    #[test]
    fn rejects_anything_but_two_part_bearer() {
        for value in [
            "Basic credentials",
            "bearer abc.def.ghi",
            "Bearer",
            "Bearer    ",
            "Bearer abc def",
            "abc.def.ghi",
        ] {
            let err = bearer_token(&headers(value)).unwrap_err();
            assert!(matches!(err, AuthError::InvalidAuthorization), "{value:?}");
            assert_eq!(err.status().as_u16(), 400);
        }
    }

    #[test]
    fn rejects_non_ascii_header() {
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        let err = bearer_token(&map).unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthorization));
    }

    #[tokio::test]
    async fn authorized_extractor_without_layer_is_server_error() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = Authorized::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthLayer));
        assert_eq!(err.status().as_u16(), 500);
        assert_eq!(err.code(), "internal_error");

        let payload: TokenPayload =
            serde_json::from_value(serde_json::json!({ "sub": "x" })).unwrap();
        parts.extensions.insert(payload.clone());
        let Authorized(found) = Authorized::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, payload);
    }
}
