use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

pub const UNKNOWN_IDENTITY: &str = "unknown";
const FORWARDED_FOR: &str = "x-forwarded-for";

// Usage of one client identity in one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientUsage {
    pub count: u32,
    pub window: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    Rejected,
}

// Fixed-window request counter keyed by client identity. A burst across a
// window boundary can get up to twice the limit through; quotas are per process
pub struct RateLimiter {
    usage: DashMap<String, ClientUsage>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            usage: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn check(&self, identity: &str) -> Decision {
        self.check_at(identity, Utc::now())
    }

    pub fn check_at(&self, identity: &str, now: DateTime<Utc>) -> Decision {
        let window = self.window_index(now);

        // entry() holds the shard lock for the whole read-modify-write
        let mut entry = self
            .usage
            .entry(identity.to_string())
            .or_insert(ClientUsage { count: 0, window });

        if entry.window != window {
            *entry = ClientUsage { count: 1, window };
            return Decision::Admitted;
        }

        if entry.count < self.limit {
            entry.count += 1;
            return Decision::Admitted;
        }

        Decision::Rejected
    }

    // Drop records from windows before the current one, returns how many went
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let current = self.window_index(now);
        let before = self.usage.len();
        self.usage.retain(|_, usage| usage.window >= current);
        before.saturating_sub(self.usage.len())
    }

    pub fn tracked_identities(&self) -> usize {
        self.usage.len()
    }

    #[cfg(test)]
    pub fn usage(&self, identity: &str) -> Option<ClientUsage> {
        self.usage.get(identity).map(|entry| *entry)
    }

    fn window_index(&self, now: DateTime<Utc>) -> i64 {
        let secs = self.window.as_secs().max(1) as i64;
        now.timestamp().div_euclid(secs)
    }
}

// Who is asking: trusted proxy header, then first x-forwarded-for hop,
// then the shared "unknown" bucket
pub fn client_identity(headers: &HeaderMap, trusted_header: &str) -> String {
    let trusted = headers
        .get(trusted_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let forwarded = || {
        headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    trusted
        .or_else(forwarded)
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_string()
}

// Background sweep so identities from old windows don't pile up
pub async fn sweeper(limiter: std::sync::Arc<RateLimiter>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    tracing::info!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;
        let removed = limiter.sweep();
        crate::metrics::RATE_LIMIT_IDENTITIES.set(limiter.tracked_identities() as f64);
        if removed > 0 {
            tracing::debug!(removed, "swept stale rate limit records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    const LIMIT: u32 = 60;

    fn limiter() -> RateLimiter {
        RateLimiter::new(LIMIT, Duration::from_secs(60))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn sixty_first_request_in_a_window_is_rejected() {
        let limiter = limiter();
        // base is a multiple of 60, so base..base+59 is one window
        let base = 1_700_000_040;

        for i in 0..LIMIT {
            assert_eq!(
                limiter.check_at("1.2.3.4", at(base + (i as i64 % 60))),
                Decision::Admitted,
                "request {i}"
            );
        }
        assert_eq!(limiter.check_at("1.2.3.4", at(base + 59)), Decision::Rejected);
        // rejection doesn't count
        assert_eq!(limiter.usage("1.2.3.4").unwrap().count, LIMIT);

        assert_eq!(limiter.check_at("1.2.3.4", at(base + 60)), Decision::Admitted);
        assert_eq!(
            limiter.usage("1.2.3.4"),
            Some(ClientUsage {
                count: 1,
                window: (base + 60) / 60
            })
        );
    }

    #[test]
    fn identities_have_independent_quotas() {
        let limiter = limiter();
        let now = at(1_700_000_040);

        for _ in 0..LIMIT {
            limiter.check_at("a", now);
        }
        assert_eq!(limiter.check_at("a", now), Decision::Rejected);
        assert_eq!(limiter.check_at("b", now), Decision::Admitted);
        assert_eq!(limiter.usage("b").unwrap().count, 1);
    }

    #[test]
    fn boundary_burst_admits_twice_the_limit() {
        let limiter = limiter();
        let last_second = at(1_700_000_039);
        let next_second = at(1_700_000_040);

        let admitted = (0..LIMIT)
            .map(|_| limiter.check_at("c", last_second))
            .chain((0..LIMIT).map(|_| limiter.check_at("c", next_second)))
            .filter(|d| *d == Decision::Admitted)
            .count();
        assert_eq!(admitted, 2 * LIMIT as usize);
    }

    #[test]
    fn sweep_drops_only_stale_windows() {
        let limiter = limiter();
        limiter.check_at("old", at(1_700_000_000));
        limiter.check_at("fresh", at(1_700_000_100));

        assert_eq!(limiter.sweep_at(at(1_700_000_100)), 1);
        assert_eq!(limiter.tracked_identities(), 1);
        assert!(limiter.usage("old").is_none());
        assert!(limiter.usage("fresh").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_never_over_admit() {
        let limiter = std::sync::Arc::new(limiter());
        let now = at(1_700_000_040);

        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_at("shared", now) })
            })
            .collect();

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() == Decision::Admitted {
                admitted += 1;
            }
        }
        assert_eq!(admitted, LIMIT);
    }

    #[test]
    fn identity_prefers_trusted_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers, "cf-connecting-ip"), UNKNOWN_IDENTITY);

        headers.insert(FORWARDED_FOR, HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        assert_eq!(client_identity(&headers, "cf-connecting-ip"), "10.0.0.1");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_identity(&headers, "cf-connecting-ip"), "203.0.113.9");
    }
}
