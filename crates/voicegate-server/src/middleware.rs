use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::AppState;

/// Paths reachable without an API key.
pub const AUTH_EXEMPT_PATHS: &[&str] = &["/", "/health"];

/// Maps before eviction of expired windows kicks in.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Compares two byte strings in time independent of where they differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extracts the presented API key from `X-API-Key` or `Authorization: Bearer`.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get("x-api-key") {
        return value.to_str().ok().filter(|key| !key.is_empty());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|key| !key.is_empty())
}

/// Middleware to authenticate requests via `X-API-Key` or `Authorization: Bearer`.
///
/// Does nothing when no key is configured. `/` and `/health` are always
/// reachable so monitors do not need the key.
pub async fn auth_middleware(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?
        .clone();

    let Some(expected) = state.config.server.api_key() else {
        return Ok(next.run(req).await);
    };

    if AUTH_EXEMPT_PATHS.contains(&req.uri().path()) {
        return Ok(next.run(req).await);
    }

    match presented_key(req.headers()) {
        None => {
            tracing::debug!(path = %req.uri().path(), "request without API key");
            return Err(ApiError::Unauthorized(
                "Missing API key. Use X-API-Key header or Bearer token.".to_string(),
            ));
        }
        Some(key) if !constant_time_eq(key.as_bytes(), expected.as_bytes()) => {
            tracing::warn!(path = %req.uri().path(), "request with invalid API key");
            return Err(ApiError::Unauthorized("Invalid API key".to_string()));
        }
        Some(_) => {}
    }

    Ok(next.run(req).await)
}

/// Rate limiting key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    /// Rate limit by client IP address.
    Ip(IpAddr),
    /// Shared bucket for requests whose origin cannot be determined.
    Unknown,
}

impl RateLimitKey {
    /// Client key for a request: the first `X-Forwarded-For` entry, else the
    /// socket peer, else the shared unknown bucket.
    pub fn from_request(req: &Request<Body>) -> Self {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            RateLimitKey::Ip(ip)
        } else if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>()
        {
            RateLimitKey::Ip(addr.ip())
        } else {
            RateLimitKey::Unknown
        }
    }
}

/// In-memory rate limiter state.
///
/// Uses a simple fixed window counter per client.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<RateLimitKey, (u32, Instant)>>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check if the request is allowed.
    ///
    /// Returns `Err` with the time until the window resets when the limit is
    /// exceeded.
    pub fn check(&self, key: RateLimitKey) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, key: RateLimitKey, now: Instant) -> Result<(), Duration> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A stale counter is preferable to refusing every request.
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };

        // Evict only expired windows; clearing everything would reset
        // clients that are currently limited.
        if state.len() > MAX_TRACKED_CLIENTS {
            let window = self.window;
            state.retain(|_, (_, start)| now.saturating_duration_since(*start) <= window);
        }

        let (count, start) = state.entry(key).or_insert((0, now));

        let elapsed = now.saturating_duration_since(*start);
        if elapsed > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.limit {
            return Err(self.window - elapsed);
        }
        *count += 1;
        Ok(())
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        match self.state.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?
        .clone();

    let key = RateLimitKey::from_request(&req);
    let limiter = &state.rate_limiter;

    if let Err(remaining) = limiter.check(key.clone()) {
        // Round up so clients never retry before the window resets.
        let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        tracing::info!(?key, retry_after, "rate limit exceeded");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "detail": format!(
                    "Rate limit exceeded. Maximum {} requests per {} seconds.",
                    limiter.limit(),
                    limiter.window().as_secs()
                )
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after.max(1)));
        return Ok(response);
    }

    Ok(next.run(req).await)
}
