//! Route definitions for the API.

pub mod products;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::error::{handle_timeout, method_not_allowed, route_not_found};
use crate::middleware::correlation_id_middleware;
use crate::state::AppState;

/// Build the complete application service.
///
/// Trailing slashes are trimmed before the router sees the path, so
/// `/products/` and `/products` reach the same handler.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let body_limit = state.config().body_limit;
    let request_timeout = state.config().request_timeout;

    NormalizePathLayer::trim_trailing_slash().layer(router(body_limit, request_timeout, state))
}

fn router(body_limit: usize, request_timeout: Duration, state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(product_routes(body_limit))
        .merge(user_routes())
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Product routes. Write payloads are capped at `body_limit` bytes.
fn product_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Registration and login routes.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::register))
        .route("/auth", post(users::login))
}

/// Span for one request. `correlation_id` and `user_id` are filled in later
/// by the correlation middleware and the auth extractors.
fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        correlation_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
