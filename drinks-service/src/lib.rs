pub mod app_state;
pub mod config;
pub mod drink;
pub mod drink_handlers;
pub mod repo;
pub mod request_id;

use axum::http::header::CONTENT_TYPE;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use common_auth::{PERM_DELETE_DRINKS, PERM_GET_DRINKS_DETAIL, PERM_PATCH_DRINKS, PERM_POST_DRINKS};
use common_http_errors::record_http_errors;

pub use app_state::AppState;
pub use common_http_errors::ApiError;
pub use config::ServiceConfig;

use drink_handlers::{
    create_drink, delete_drink, list_drink_details, list_drinks, method_not_allowed, not_found,
    patch_drink,
};

pub const SERVICE_NAME: &str = "drinks-service";

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        common_http_errors::gather(),
    )
}

/// All routes of the service. Protected routes carry their own auth layer so a
/// public method on the same path stays public.
pub fn build_router(state: AppState) -> Router {
    let gate = state.gate().clone();

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/drinks",
            get(list_drinks)
                .merge(post(create_drink).route_layer(gate.require(PERM_POST_DRINKS)))
                .fallback(method_not_allowed),
        )
        .route(
            "/drinks-detail",
            get(list_drink_details)
                .route_layer(gate.require(PERM_GET_DRINKS_DETAIL))
                .fallback(method_not_allowed),
        )
        .route(
            "/drinks/:id",
            patch(patch_drink)
                .route_layer(gate.require(PERM_PATCH_DRINKS))
                .merge(delete(delete_drink).route_layer(gate.require(PERM_DELETE_DRINKS)))
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(SERVICE_NAME, record_http_errors))
        .layer(middleware::from_fn(request_id::request_id))
        .with_state(state)
}
