//! Per-source sliding-window rate limiting.
//!
//! The counter map is the only shared mutable state in the gateway. It
//! lives behind `DashMap`, whose per-key entry lock makes the
//! increment-and-compare atomic — a racy undercount here would be a
//! limiter bypass under load.
//!
//! The limiter is an injectable component held in `AppState`, not a
//! process-wide singleton, so a distributed implementation can replace
//! it without touching call sites.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum::response::Html;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::warn;

use crate::AppState;
use crate::error::AppError;

/// Window length for the general limiter.
const WINDOW: Duration = Duration::from_secs(60);

/// Consecutive login failures allowed before a source is locked out.
const LOGIN_MAX_FAILURES: u32 = 5;

/// Lockout window for failed logins.
const LOGIN_LOCKOUT: Duration = Duration::from_secs(15 * 60);

/// Sweep the counter map once it holds this many entries.
const SWEEP_THRESHOLD: usize = 10_000;

/// Path sensitivity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Login/auth endpoints: low budget.
    Sensitive,
    /// Everything else.
    General,
}

impl Tier {
    pub fn for_path(path: &str) -> Self {
        if path.starts_with("/api/auth") {
            Tier::Sensitive
        } else {
            Tier::General
        }
    }
}

/// Admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Sliding-window counter keyed by client source.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    general_limit: u32,
    sensitive_limit: u32,
}

impl RateLimiter {
    pub fn new(general_limit: u32, sensitive_limit: u32) -> Self {
        Self {
            windows: DashMap::new(),
            general_limit,
            sensitive_limit,
        }
    }

    fn limit(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Sensitive => self.sensitive_limit,
            Tier::General => self.general_limit,
        }
    }

    /// Admit or reject one request from `key`.
    pub fn admit(&self, key: &str, tier: Tier) -> Admission {
        self.admit_at(key, tier, Instant::now())
    }

    /// Clock-injected admission, used directly by tests.
    pub fn admit_at(&self, key: &str, tier: Tier, now: Instant) -> Admission {
        self.sweep_if_needed(now);
        let limit = self.limit(tier);

        // Entry lock holds for the whole increment-and-compare.
        let mut window = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + WINDOW,
        });

        if now >= window.reset_at {
            window.count = 1;
            window.reset_at = now + WINDOW;
            return Admission::Admitted;
        }

        window.count += 1;
        if window.count <= limit {
            Admission::Admitted
        } else {
            Admission::Limited {
                retry_after: window.reset_at - now,
            }
        }
    }

    /// Drop expired windows once the map gets large. Expired entries are
    /// otherwise reset lazily on next touch.
    fn sweep_if_needed(&self, now: Instant) {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows.retain(|_, w| now < w.reset_at);
        }
    }
}

/// Narrower failed-login limiter, counted separately from general
/// traffic. A successful login resets the source; entries expire after
/// the lockout window on their own.
#[derive(Debug)]
pub struct LoginGuard {
    failures: DashMap<String, Window>,
}

impl LoginGuard {
    pub fn new() -> Self {
        Self {
            failures: DashMap::new(),
        }
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.is_locked_at(key, Instant::now())
    }

    pub fn is_locked_at(&self, key: &str, now: Instant) -> bool {
        // Decide first, then drop the shard guard before removing.
        let expired = match self.failures.get(key) {
            Some(w) if now < w.reset_at => return w.count >= LOGIN_MAX_FAILURES,
            Some(_) => true,
            None => false,
        };
        if expired {
            self.failures.remove(key);
        }
        false
    }

    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now());
    }

    pub fn record_failure_at(&self, key: &str, now: Instant) {
        let mut w = self.failures.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + LOGIN_LOCKOUT,
        });
        if now >= w.reset_at {
            w.count = 0;
        }
        w.count += 1;
        w.reset_at = now + LOGIN_LOCKOUT;
    }

    pub fn record_success(&self, key: &str) {
        self.failures.remove(key);
    }
}

impl Default for LoginGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Client source identity, injected into request extensions so handlers
/// (login accounting) share the limiter's view of the caller.
#[derive(Debug, Clone)]
pub struct ClientSource(pub String);

/// First address in a forwarded-for chain, falling back to the direct
/// peer address.
pub fn source_key(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    match peer {
        Some(ip) => ip.to_string(),
        None => "unknown".to_string(),
    }
}

/// The single place that decides rate-limit exemption: non-production
/// execution, and loopback/private-range sources.
pub fn is_exempt(source: &str, production: bool) -> bool {
    if !production {
        return true;
    }
    match source.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback() || ip.is_private(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback() || (ip.segments()[0] & 0xfe00) == 0xfc00,
        Err(_) => false,
    }
}

/// Body served to browser-navigable paths on limiter rejection. Served
/// under the original URL, no redirect.
const PLEASE_WAIT_PAGE: &str = r#"<!doctype html>
<html lang="tr">
<head><meta charset="utf-8"><meta http-equiv="refresh" content="15"><title>Lütfen bekleyin</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 4rem;">
<h1>Lütfen bekleyin</h1>
<p>Çok fazla istek aldık. Sayfa birazdan kendiliğinden yenilenecek.</p>
</body>
</html>
"#;

/// Axum middleware: admit or reject the request before any auth work.
pub async fn enforce(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip());
    let source = source_key(request.headers(), peer);
    request.extensions_mut().insert(ClientSource(source.clone()));

    if is_exempt(&source, state.config.production) {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path().to_string();
    match state.rate_limiter.admit(&source, Tier::for_path(&path)) {
        Admission::Admitted => Ok(next.run(request).await),
        Admission::Limited { retry_after } => {
            warn!(source, path, "rate limit exceeded");
            if path.starts_with("/api") {
                Err(AppError::RateLimited {
                    retry_after_secs: retry_after.as_secs().max(1),
                })
            } else {
                Ok((StatusCode::TOO_MANY_REQUESTS, Html(PLEASE_WAIT_PAGE)).into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_limit_and_reset() {
        let limiter = RateLimiter::new(100, 3);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert_eq!(
                limiter.admit_at("1.2.3.4", Tier::Sensitive, t0),
                Admission::Admitted
            );
        }
        // N+1th request within the window is rejected.
        assert!(matches!(
            limiter.admit_at("1.2.3.4", Tier::Sensitive, t0),
            Admission::Limited { .. }
        ));

        // After the window elapses a fresh one starts, even though the
        // prior window was exhausted.
        let t1 = t0 + WINDOW + Duration::from_secs(1);
        assert_eq!(
            limiter.admit_at("1.2.3.4", Tier::Sensitive, t1),
            Admission::Admitted
        );
    }

    #[test]
    fn tiers_are_independent_budgets() {
        let limiter = RateLimiter::new(5, 2);
        let t0 = Instant::now();

        assert_eq!(limiter.admit_at("k", Tier::Sensitive, t0), Admission::Admitted);
        assert_eq!(limiter.admit_at("k", Tier::Sensitive, t0), Admission::Admitted);
        assert!(matches!(
            limiter.admit_at("k", Tier::Sensitive, t0),
            Admission::Limited { .. }
        ));
        // Same key under the general limit still has headroom.
        assert_eq!(limiter.admit_at("k", Tier::General, t0), Admission::Admitted);
    }

    #[test]
    fn distinct_sources_do_not_share_windows() {
        let limiter = RateLimiter::new(1, 1);
        let t0 = Instant::now();
        assert_eq!(limiter.admit_at("a", Tier::General, t0), Admission::Admitted);
        assert_eq!(limiter.admit_at("b", Tier::General, t0), Admission::Admitted);
    }

    #[test]
    fn sensitive_tier_for_auth_paths() {
        assert_eq!(Tier::for_path("/api/auth/login"), Tier::Sensitive);
        assert_eq!(Tier::for_path("/api/settings"), Tier::General);
        assert_eq!(Tier::for_path("/menu/kebapci"), Tier::General);
    }

    #[test]
    fn exemption_covers_dev_and_local_sources() {
        assert!(is_exempt("203.0.113.7", false)); // non-production
        assert!(is_exempt("127.0.0.1", true));
        assert!(is_exempt("10.1.2.3", true));
        assert!(is_exempt("192.168.1.10", true));
        assert!(is_exempt("::1", true));
        assert!(!is_exempt("203.0.113.7", true));
        assert!(!is_exempt("unknown", true));
    }

    #[test]
    fn forwarded_for_beats_peer_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let peer = Some("10.0.0.1".parse().unwrap());
        assert_eq!(source_key(&headers, peer), "203.0.113.9");

        let empty = HeaderMap::new();
        assert_eq!(source_key(&empty, peer), "10.0.0.1");
        assert_eq!(source_key(&empty, None), "unknown");
    }

    #[test]
    fn login_guard_locks_and_resets() {
        let guard = LoginGuard::new();
        let t0 = Instant::now();

        for _ in 0..LOGIN_MAX_FAILURES {
            assert!(!guard.is_locked_at("5.6.7.8", t0));
            guard.record_failure_at("5.6.7.8", t0);
        }
        assert!(guard.is_locked_at("5.6.7.8", t0));

        // Lockout expires on its own.
        assert!(!guard.is_locked_at("5.6.7.8", t0 + LOGIN_LOCKOUT + Duration::from_secs(1)));

        // Success clears the counter outright.
        guard.record_failure_at("5.6.7.8", t0);
        guard.record_success("5.6.7.8");
        assert!(!guard.is_locked_at("5.6.7.8", t0));
    }
}
