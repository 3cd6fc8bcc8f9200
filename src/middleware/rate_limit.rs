use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::{net::SocketAddr, sync::Arc};
use tracing::warn;

use crate::auth::dtos::ErrorResponse;

/// Fixed-window request counter, keyed by client IP. The AI endpoints sit
/// behind this so one client cannot monopolize the analysis queue.
#[derive(Clone)]
pub struct RateLimit {
    windows: Arc<DashMap<String, Window>>,
    max_requests: u32,
    window_seconds: i64,
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started_at: DateTime<Utc>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window_seconds,
        }
    }

    /// Count one request from `key`; false once the window's budget is spent.
    fn allow(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window {
                count: 0,
                started_at: now,
            });

        let window = entry.value_mut();
        if now.signed_duration_since(window.started_at) >= Duration::seconds(self.window_seconds) {
            window.count = 0;
            window.started_at = now;
        }

        window.count += 1;
        window.count <= self.max_requests
    }
}

pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(rate_limit): State<RateLimit>,
    req: Request,
    next: Next,
) -> Response {
    let ip = addr.ip().to_string();

    if !rate_limit.allow(&ip, Utc::now()) {
        warn!(client_ip = %ip, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Rate limit exceeded".to_string(),
            }),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_key() {
        let limit = RateLimit::new(2, 60);
        let now = Utc::now();

        assert!(limit.allow("10.0.0.1", now));
        assert!(limit.allow("10.0.0.1", now));
        assert!(!limit.allow("10.0.0.1", now));

        // A different client has its own window.
        assert!(limit.allow("10.0.0.2", now));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limit = RateLimit::new(1, 60);
        let start = Utc::now();

        assert!(limit.allow("10.0.0.1", start));
        assert!(!limit.allow("10.0.0.1", start + Duration::seconds(30)));
        assert!(limit.allow("10.0.0.1", start + Duration::seconds(61)));
    }
}
