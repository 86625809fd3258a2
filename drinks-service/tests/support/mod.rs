#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use common_auth::testing::TestIssuer;
use common_auth::{AuthConfig, AuthGate};
use drinks_service::{build_router, repo, AppState};
use httpmock::prelude::*;
use once_cell::sync::Lazy;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const DOMAIN: &str = "coffee.test";
pub const AUDIENCE: &str = "coffeeshop";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

pub static ISSUER: Lazy<TestIssuer> =
    Lazy::new(|| TestIssuer::new("barista-key", DOMAIN, AUDIENCE));
pub static STRANGER: Lazy<TestIssuer> =
    Lazy::new(|| TestIssuer::new("stranger-key", DOMAIN, AUDIENCE));

/// A running app backed by in-memory SQLite and a mocked key endpoint.
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub jwks: MockServer,
}

impl TestApp {
    pub async fn start() -> Self {
        let jwks = MockServer::start_async().await;
        jwks.mock_async(|when, then| {
            when.method(GET).path(JWKS_PATH);
            then.status(200)
                .header("content-type", "application/json")
                .body(ISSUER.jwks_body().to_string());
        })
        .await;
        Self::with_server(jwks).await
    }

    /// Uses `jwks` as-is, so the caller decides what the key endpoint returns.
    pub async fn with_server(jwks: MockServer) -> Self {
        let db = repo::connect("sqlite::memory:").await.expect("in-memory db");
        repo::reset_and_seed(&db).await.expect("seed");
        let config = AuthConfig::new(DOMAIN, AUDIENCE).with_jwks_url(jwks.url(JWKS_PATH));
        let router = build_router(AppState::new(db.clone(), AuthGate::new(config).expect("gate")));
        Self { router, db, jwks }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("infallible")
    }

    pub async fn call(&self, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (u16, Value) {
        let resp = self.send(request(method, uri, bearer, body)).await;
        let status = resp.status().as_u16();
        (status, json_body(resp).await)
    }
}

pub fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = bearer {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub async fn json_body(resp: Response<Body>) -> Value {
    let text = body_text(resp).await;
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
