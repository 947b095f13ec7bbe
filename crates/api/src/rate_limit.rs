//! Per-IP fixed-window rate limiting for the unauthenticated write routes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::errors;
use crate::config::RateQuota;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug)]
struct Table {
    windows: HashMap<String, Window>,
    /// Expired windows are swept at most once per quota window.
    last_sweep: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    quota: RateQuota,
    message: &'static str,
    table: Mutex<Table>,
}

impl RateLimiter {
    pub fn new(quota: RateQuota, message: &'static str) -> Self {
        Self {
            quota,
            message,
            table: Mutex::new(Table {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Count a hit for `key`. Returns the time until the window resets when
    /// the quota is already spent.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.quota.window;

        if now.duration_since(table.last_sweep) >= window {
            table.windows.retain(|_, w| now.duration_since(w.started) < window);
            table.last_sweep = now;
        }

        let entry = table.windows.entry(key.to_string()).or_insert(Window { started: now, hits: 0 });
        if now.duration_since(entry.started) >= window {
            *entry = Window { started: now, hits: 0 };
        }

        if entry.hits >= self.quota.max {
            let elapsed = now.duration_since(entry.started);
            return Err(window.saturating_sub(elapsed));
        }
        entry.hits += 1;
        Ok(())
    }
}

/// Whole seconds until retry, never less than one.
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce(State(limiter): State<Arc<RateLimiter>>, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    match limiter.check(&key, Instant::now()) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = retry_after_secs(wait);
            tracing::warn!(client = %key, path = %req.uri().path(), retry_after, "rate limit exceeded");
            errors::rate_limited(limiter.message(), retry_after)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, secs: u64) -> RateLimiter {
        RateLimiter::new(RateQuota::new(max, Duration::from_secs(secs)), "slow down")
    }

    #[test]
    fn allows_up_to_quota_then_rejects() {
        let l = limiter(2, 60);
        let t0 = Instant::now();
        assert!(l.check("1.2.3.4", t0).is_ok());
        assert!(l.check("1.2.3.4", t0).is_ok());

        let wait = l.check("1.2.3.4", t0 + Duration::from_secs(10)).unwrap_err();
        assert_eq!(wait, Duration::from_secs(50));

        // other clients have their own window
        assert!(l.check("5.6.7.8", t0).is_ok());
    }

    #[test]
    fn window_resets_after_expiry() {
        let l = limiter(1, 60);
        let t0 = Instant::now();
        assert!(l.check("k", t0).is_ok());
        assert!(l.check("k", t0 + Duration::from_secs(59)).is_err());
        assert!(l.check("k", t0 + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn expired_windows_are_swept_once_per_window() {
        let l = limiter(1, 60);
        let t0 = Instant::now();
        for i in 0..100 {
            assert!(l.check(&format!("10.0.0.{i}"), t0).is_ok());
        }
        assert_eq!(l.table.lock().unwrap().windows.len(), 100);

        // Inside the window nothing is swept.
        assert!(l.check("k", t0 + Duration::from_secs(30)).is_ok());
        assert_eq!(l.table.lock().unwrap().windows.len(), 101);

        assert!(l.check("k2", t0 + Duration::from_secs(61)).is_ok());
        let table = l.table.lock().unwrap();
        assert_eq!(table.windows.len(), 2);
        assert!(table.windows.contains_key("k"));
    }

    #[test]
    fn retry_after_rounds_up_to_at_least_one_second() {
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(900)), 900);
    }
}
