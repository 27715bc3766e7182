use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::error::AppError;
use crate::metrics::{RATE_LIMIT_IDENTITIES, RATE_LIMITED, REQUEST_TOTAL};
use crate::rate_limit::{Decision, client_identity};
use crate::state::AppState;

// Request line with elapsed time, logged whatever the outcome
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        %uri,
        status = res.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    res
}

pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    REQUEST_TOTAL.inc();

    let identity = client_identity(req.headers(), &state.trusted_ip_header);
    let decision = state.rate_limiter.check(&identity);
    RATE_LIMIT_IDENTITIES.set(state.rate_limiter.tracked_identities() as f64);

    if decision == Decision::Rejected {
        RATE_LIMITED.inc();
        tracing::debug!(%identity, "rate limit exceeded");
        return AppError::RateLimited.into_response();
    }

    next.run(req).await
}

// Last line of defence: a panic below the rate limiter still gets a JSON 500
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(details).into_response()
}
