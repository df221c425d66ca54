//! Concurrency tests for the fixed-window rate limiter.
//!
//! These tests verify the rate limiter is correct under concurrent access:
//! - Multiple threads checking the same key simultaneously
//! - Many distinct keys under concurrent load
//! - No panics or deadlocks while eviction runs

use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voicegate_server::middleware::{RateLimitKey, RateLimiter};

#[tokio::test]
async fn test_rate_limiter_concurrent_same_key() {
    let limit = 100u32;
    let limiter = Arc::new(RateLimiter::new(limit, Duration::from_secs(60)));
    let allowed_count = Arc::new(AtomicU32::new(0));
    let denied_count = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();

    // Spawn 200 concurrent tasks all checking the same key
    for _ in 0..200 {
        let limiter = limiter.clone();
        let allowed = allowed_count.clone();
        let denied = denied_count.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let key = RateLimitKey::Ip("10.0.0.1".parse().unwrap());
            if limiter.check(key).is_ok() {
                allowed.fetch_add(1, Ordering::Relaxed);
            } else {
                denied.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.await.expect("task should not panic");
    }

    // The counter is updated under one lock, so the split is exact.
    assert_eq!(allowed_count.load(Ordering::Relaxed), limit);
    assert_eq!(denied_count.load(Ordering::Relaxed), 100);
}

#[tokio::test]
async fn test_rate_limiter_concurrent_distinct_keys() {
    let limit = 5u32;
    let limiter = Arc::new(RateLimiter::new(limit, Duration::from_secs(60)));

    let mut handles = Vec::new();

    // 50 distinct IPs, each sends exactly `limit` requests concurrently
    for ip_idx in 0..50u32 {
        for _ in 0..limit {
            let limiter = limiter.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let ip: IpAddr = std::net::Ipv4Addr::from(ip_idx.to_be_bytes()).into();
                limiter.check(RateLimitKey::Ip(ip)).is_ok()
            }));
        }
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.expect("task should not panic") {
            allowed += 1;
        }
    }

    assert_eq!(
        allowed, 250,
        "each IP sends exactly `limit` requests, all should be allowed"
    );
}

#[tokio::test]
async fn test_rate_limiter_eviction_under_concurrent_load() {
    // Eviction triggers above 10_000 tracked clients.
    let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60)));

    let mut handles = Vec::new();
    for i in 0..10_100u32 {
        let limiter = limiter.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let ip: IpAddr = std::net::Ipv4Addr::from(i.to_be_bytes()).into();
            let _ = limiter.check(RateLimitKey::Ip(ip));
        }));
    }

    for handle in handles {
        handle.await.expect("eviction under load should not panic");
    }

    // Every window is still active, so nothing was evicted.
    assert_eq!(limiter.tracked(), 10_100);
    let key = RateLimitKey::Ip("0.0.39.115".parse::<IpAddr>().unwrap()); // index 10099
    assert!(
        limiter.check(key).is_ok(),
        "recently-used key should still be tracked after eviction"
    );
}
