use std::collections::HashSet;
use std::sync::Mutex;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";
const MAX_ERROR_CODES: usize = 40;
const OVERFLOW_CODE: &str = "other";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub code: String,
    pub message: String,
}

/// Non-auth failures of the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: Option<String> },
    NotFound { code: &'static str },
    MethodNotAllowed,
    Unprocessable { code: &'static str, message: Option<String> },
    Internal { message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { message: Some(e.to_string()) }
    }
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { code: "bad_request", message: Some(message.into()) }
    }
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable { code: "unprocessable", message: Some(message.into()) }
    }
    pub fn not_found() -> Self {
        Self::NotFound { code: "not_found" }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::NotFound { code } => (StatusCode::NOT_FOUND, code, None),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", None),
            ApiError::Unprocessable { code, message } => (StatusCode::UNPROCESSABLE_ENTITY, code, message),
            ApiError::Internal { message } => {
                // Detail goes to the log, never to the client.
                if let Some(detail) = &message {
                    tracing::error!(error = %detail, "internal error");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            code: code.into(),
            message: message.unwrap_or_else(|| default_message(status).to_string()),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(code) {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::NOT_FOUND => "resource not found",
        StatusCode::METHOD_NOT_ALLOWED => "method not allowed",
        StatusCode::UNPROCESSABLE_ENTITY => "unprocessable",
        _ => "internal server error",
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    )
    .expect("valid http_errors_total definition");
    REGISTRY.register(Box::new(counter.clone())).ok();
    counter
});

static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Caps label cardinality: past MAX_ERROR_CODES distinct codes, new ones count as `other`.
fn bounded_code(code: &str) -> String {
    let Ok(mut seen) = SEEN_CODES.lock() else {
        return OVERFLOW_CODE.to_string();
    };
    if seen.contains(code) {
        return code.to_string();
    }
    if seen.len() >= MAX_ERROR_CODES {
        return OVERFLOW_CODE.to_string();
    }
    seen.insert(code.to_string());
    code.to_string()
}

/// Middleware counting error responses by their `X-Error-Code` header.
///
/// `router.layer(middleware::from_fn_with_state("drinks-service", record_http_errors))`
pub async fn record_http_errors(
    State(service): State<&'static str>,
    req: Request,
    next: Next,
) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        let code = resp
            .headers()
            .get(ERROR_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unlabelled");
        let code = bounded_code(code);
        HTTP_ERRORS_TOTAL
            .with_label_values(&[service, code.as_str(), status.as_str()])
            .inc();
    }
    resp
}

/// Prometheus text exposition of everything in [`REGISTRY`].
pub fn gather() -> String {
    Lazy::force(&HTTP_ERRORS_TOTAL);
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
