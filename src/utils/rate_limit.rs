use crate::types::Context;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hyper::StatusCode;
use serde_json::json;
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client address. The rejection is
/// uniform across clients and phone numbers; callers learn only how long to
/// wait before the window resets.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request against the client's window. Returns the
    /// retry-after hint in seconds when the window is exhausted.
    pub async fn try_acquire(&self, client: IpAddr) -> Result<(), u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(client).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started_at);
            let retry_after = self.window.saturating_sub(elapsed).as_secs();
            return Err(retry_after.max(1));
        }

        window.count += 1;
        Ok(())
    }
}

pub async fn middleware(
    State(ctx): State<Arc<Context>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    match ctx.otp_limiter.try_acquire(addr.ip()).await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "error": "Too many requests, please try again later",
                "retryAfter": retry_after,
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    #[tokio::test]
    async fn rejects_requests_beyond_the_window_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(900));

        assert!(limiter.try_acquire(client()).await.is_ok());
        assert!(limiter.try_acquire(client()).await.is_ok());

        let rejected = limiter.try_acquire(client()).await;
        assert!(rejected.is_err());
        assert!(rejected.unwrap_err() >= 1);
    }

    #[tokio::test]
    async fn windows_are_tracked_per_client() {
        let limiter = RateLimiter::new(1, Duration::from_secs(900));
        let other: IpAddr = "198.51.100.23".parse().unwrap();

        assert!(limiter.try_acquire(client()).await.is_ok());
        assert!(limiter.try_acquire(client()).await.is_err());
        assert!(limiter.try_acquire(other).await.is_ok());
    }

    #[tokio::test]
    async fn window_resets_after_it_expires() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.try_acquire(client()).await.is_ok());
        assert!(limiter.try_acquire(client()).await.is_err());

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(limiter.try_acquire(client()).await.is_ok());
    }
}
