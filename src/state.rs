use std::sync::Arc;
use crate::rate_limit::RateLimiter;
use crate::renderer::Renderer;
// app's shared state

pub struct AppState {
    pub renderer: Arc<dyn Renderer>,
    pub rate_limiter: Arc<RateLimiter>,
    pub trusted_ip_header: String, // proxy header carrying the client ip
}
