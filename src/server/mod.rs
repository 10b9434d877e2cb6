//! Thin HTTP boundary: routing, CORS, security headers, and the mapping
//! from discovery outcomes to responses.

pub mod error;
pub mod handlers;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::discovery::Discovery;

/// Shared per-request state. Cheap to clone; the discovery handle carries
/// the HTTP client pool.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Discovery,
}

impl AppState {
    pub fn new(discovery: Discovery) -> Self {
        Self { discovery }
    }
}

pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/api/search-feeds", post(handlers::search_feeds))
        .route("/api/health", get(handlers::health))
        .layer(cors_layer(config))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
