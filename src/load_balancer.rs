use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::{Duration, interval};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// Single render backend

pub struct Backend {
    pub url: String,
    healthy: AtomicBool,
}

impl Backend {
    pub fn new(url: String) -> Self {
        Self {
            url,
            healthy: AtomicBool::new(true),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }
}

// Round-robin pool over the render backends

pub struct LoadBalancer {
    backends: Vec<Arc<Backend>>,
    current: AtomicUsize,
}

impl LoadBalancer {
    // Create from comma-separated urls "localhost:3000, render-2:3000"
    pub fn new(backends_str: &str) -> anyhow::Result<Self> {
        let backends: Vec<Arc<Backend>> = backends_str
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|url| {
                let full_url = if url.starts_with("http") {
                    url.trim_end_matches('/').to_string()
                } else {
                    format!("http://{}", url.trim_end_matches('/'))
                };
                Arc::new(Backend::new(full_url))
            })
            .collect();
        if backends.is_empty() {
            anyhow::bail!("at least one render backend is required");
        }

        tracing::info!(count = backends.len(), "render backend pool initialized");
        for (i, b) in backends.iter().enumerate() {
            tracing::info!(index = i + 1, url = %b.url, "render backend");
        }

        Ok(Self {
            backends,
            current: AtomicUsize::new(0),
        })
    }

    // Next healthy backend, round-robin from a rotating start
    pub fn next_healthy(&self) -> Option<Arc<Backend>> {
        let len = self.backends.len();
        let start = self.current.fetch_add(1, Ordering::Relaxed) % len;

        self.backends[start..]
            .iter()
            .chain(&self.backends[..start])
            .find(|backend| backend.is_healthy())
            .cloned()
    }

    pub fn all_backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    // One probe round over the pool, returns how many backends answered
    pub async fn probe_all(&self, client: &reqwest::Client, health_path: &str) -> usize {
        let mut healthy = 0;
        for backend in &self.backends {
            if backend.probe(client, health_path).await {
                healthy += 1;
            }
        }
        healthy
    }
}

impl Backend {
    // Only the health checker moves the flag; request failures never do
    async fn probe(&self, client: &reqwest::Client, health_path: &str) -> bool {
        let url = format!("{}{}", self.url, health_path);
        let is_healthy = client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .is_ok_and(|res| res.status().is_success());

        let was_healthy = self.healthy.swap(is_healthy, Ordering::Relaxed);
        match (was_healthy, is_healthy) {
            (false, true) => tracing::info!(backend = %self.url, "render backend is now healthy"),
            (true, false) => tracing::warn!(backend = %self.url, "render backend is now unhealthy"),
            _ => {}
        }
        is_healthy
    }
}

pub async fn health_checker(
    load_balancer: Arc<LoadBalancer>,
    client: reqwest::Client,
    check_interval: Duration,
    health_path: String,
) {
    let mut interval = interval(check_interval);
    tracing::info!(interval = ?check_interval, path = %health_path, "health checker started");

    loop {
        interval.tick().await;
        let healthy = load_balancer.probe_all(&client, &health_path).await;
        if healthy == 0 {
            tracing::error!("no render backend passed its health check");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_get_a_scheme_and_lose_trailing_slashes() {
        let lb = LoadBalancer::new(" localhost:3000, https://render.internal/ ,,").unwrap();
        let urls: Vec<_> = lb.all_backends().iter().map(|b| b.url.as_str()).collect();
        assert_eq!(urls, vec!["http://localhost:3000", "https://render.internal"]);
    }

    #[test]
    fn empty_backend_list_is_an_error() {
        assert!(LoadBalancer::new(" , ").is_err());
    }

    #[test]
    fn round_robin_skips_unhealthy_backends() {
        let lb = LoadBalancer::new("a:1,b:2,c:3").unwrap();
        let picks: Vec<_> = (0..3).map(|_| lb.next_healthy().unwrap().url.clone()).collect();
        assert_eq!(picks, vec!["http://a:1", "http://b:2", "http://c:3"]);

        lb.all_backends()[1].set_healthy(false);
        for _ in 0..6 {
            assert_ne!(lb.next_healthy().unwrap().url, "http://b:2");
        }

        for backend in lb.all_backends() {
            backend.set_healthy(false);
        }
        assert!(lb.next_healthy().is_none());
    }

    #[tokio::test]
    async fn failed_probe_takes_backend_out_of_rotation() {
        // nothing listens on port 1
        let lb = LoadBalancer::new("127.0.0.1:1").unwrap();
        let client = reqwest::Client::new();

        assert_eq!(lb.probe_all(&client, "/json/version").await, 0);
        assert!(!lb.all_backends()[0].is_healthy());
        assert!(lb.next_healthy().is_none());
    }
}
