use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("shot_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("shot_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref VALIDATION_FAILURES: Counter =
        register_counter!("shot_validation_failures_total", "Capture requests with invalid input").unwrap();
    pub static ref CAPTURE_FAILURES: Counter =
        register_counter!("shot_capture_failures_total", "Captures the renderer failed to produce").unwrap();
    pub static ref CAPTURE_LATENCY: Histogram = register_histogram!(
        "shot_capture_latency_seconds",
        "Renderer call latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_IDENTITIES: Gauge =
        register_gauge!("shot_rate_limit_identities", "Client identities tracked by the rate limiter").unwrap();
}
