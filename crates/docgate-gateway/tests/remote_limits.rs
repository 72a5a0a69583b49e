//! Rate limiter and response cache on virtual time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{advance, Instant};

use docgate_gateway::remote::{cache_key, HttpMethod, RateLimiter, ResponseCache};

#[tokio::test(start_paused = true)]
async fn calls_within_limit_do_not_wait() {
    let lim = RateLimiter::new(5, 100);
    let start = Instant::now();
    for _ in 0..5 {
        lim.acquire().await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(lim.in_flight(), (5, 5));
}

#[tokio::test(start_paused = true)]
async fn call_over_minute_limit_waits_for_oldest_to_expire() {
    let lim = RateLimiter::new(3, 100);
    let start = Instant::now();
    for _ in 0..3 {
        lim.acquire().await;
    }
    advance(Duration::from_millis(500)).await;

    lim.acquire().await;
    // 60s minus the 0.5s already elapsed, on top of that 0.5s.
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert!(start.elapsed() < Duration::from_secs(61));
}

#[tokio::test(start_paused = true)]
async fn saturated_windows_add_up() {
    let lim = RateLimiter::new(2, 3);
    assert_eq!(lim.reserve(), Duration::ZERO);
    assert_eq!(lim.reserve(), Duration::ZERO);
    // minute window full
    assert_eq!(lim.reserve(), Duration::from_secs(60));
    // minute window full until 60s, then the hour window is full until 3600s
    assert_eq!(lim.reserve(), Duration::from_secs(3600));
}

#[tokio::test(start_paused = true)]
async fn window_frees_up_after_sixty_seconds() {
    let lim = RateLimiter::new(2, 100);
    lim.reserve();
    lim.reserve();
    advance(Duration::from_secs(60)).await;
    assert_eq!(lim.reserve(), Duration::ZERO);
    assert_eq!(lim.in_flight().0, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_acquirers_never_exceed_the_minute_limit() {
    let lim = Arc::new(RateLimiter::new(5, 1000));
    let start = Instant::now();

    let mut handles = Vec::new();
    for _ in 0..12 {
        let lim = Arc::clone(&lim);
        handles.push(tokio::spawn(async move {
            lim.acquire().await;
            Instant::now()
        }));
    }
    let mut times = Vec::new();
    for h in handles {
        times.push(h.await.unwrap());
    }
    times.sort();

    for w in times.windows(6) {
        assert!(w[5].duration_since(w[0]) >= Duration::from_secs(60));
    }
    assert!(times[11].duration_since(start) >= Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn cache_returns_value_within_ttl_only() {
    let cache = ResponseCache::new(Duration::from_secs(300), 10);
    cache.set("k".into(), json!({ "data": 1 }));

    advance(Duration::from_secs(299)).await;
    assert_eq!(cache.get("k"), Some(json!({ "data": 1 })));

    advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("k"), None);
    // expired entry is dropped on lookup
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cache_evicts_oldest_created_entry() {
    let cache = ResponseCache::new(Duration::from_secs(300), 2);
    cache.set("a".into(), json!(1));
    advance(Duration::from_secs(1)).await;
    cache.set("b".into(), json!(2));
    advance(Duration::from_secs(1)).await;

    // reading does not refresh: eviction is by creation time
    assert_eq!(cache.get("a"), Some(json!(1)));
    cache.set("c".into(), json!(3));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(json!(2)));
    assert_eq!(cache.get("c"), Some(json!(3)));
}

#[tokio::test(start_paused = true)]
async fn cache_evicts_in_insertion_order_at_same_instant() {
    let cache = ResponseCache::new(Duration::from_secs(300), 2);
    cache.set("a".into(), json!(1));
    cache.set("b".into(), json!(2));
    cache.set("c".into(), json!(3));
    assert_eq!(cache.get("a"), None);
    assert!(cache.get("b").is_some());
}

#[test]
fn cache_key_ignores_parameter_order() {
    let a = json!({ "limit_page_length": 20, "filters": { "a": 1, "b": [1, 2] } });
    let b = json!({ "filters": { "b": [1, 2], "a": 1 }, "limit_page_length": 20 });
    assert_eq!(
        cache_key(HttpMethod::Get, "/api/resource/Item", Some(&a)),
        cache_key(HttpMethod::Get, "/api/resource/Item", Some(&b))
    );
}

#[test]
fn cache_key_separates_different_reads() {
    let a = json!({ "limit_page_length": 20 });
    let b = json!({ "limit_page_length": 21 });
    let keys = [
        cache_key(HttpMethod::Get, "/api/resource/Item", Some(&a)),
        cache_key(HttpMethod::Get, "/api/resource/Item", Some(&b)),
        cache_key(HttpMethod::Get, "/api/resource/Item", None),
        cache_key(HttpMethod::Get, "/api/resource/Customer", Some(&a)),
        cache_key(HttpMethod::Post, "/api/resource/Item", Some(&a)),
    ];
    for i in 0..keys.len() {
        for j in (i + 1)..keys.len() {
            assert_ne!(keys[i], keys[j]);
        }
    }
}
