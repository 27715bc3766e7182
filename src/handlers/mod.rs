mod health;
mod metrics;
mod take;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use take::take_handler;
