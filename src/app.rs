use axum::http::{HeaderValue, Method};
use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::{health_handler, metrics_handler, take_handler};
use crate::middleware::{handle_panic, log_requests, rate_limit};
use crate::state::AppState;

// Full request pipeline. Layers run outermost first:
// cors, logging, rate limiting, panic boundary, then the route.
pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(cors_origins))
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(health_handler))
        .route("/take", get(take_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

// "*" anywhere in the list opens cors to every origin
fn allow_origin(cors_origins: &[String]) -> AllowOrigin {
    if cors_origins.iter().any(|origin| origin == "*") {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparseable cors origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}
