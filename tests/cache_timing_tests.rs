//! Time-dependent cache behavior: retries, freshness and garbage collection
//!
//! Every test runs on a paused clock, so back-off delays and gc windows of
//! minutes elapse instantly and deterministically.

mod hooks_harness;

use academy::prelude::*;
use hooks_harness::*;
use std::time::Duration;
use tokio::time::Instant;

fn server_error() -> AdminError {
    AdminError::backend("/api/course/find-many", 503, Some(json!({"message": "unavailable"})))
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_read_retries_with_backoff() {
    let h = Harness::with_client(QueryClient::new());
    h.seed_courses(1);
    for _ in 0..3 {
        h.service.fail_next(server_error());
    }

    let started = Instant::now();
    let mut list = h.ctx.entity::<Course>().use_courses(FindArgs::new(), ReadOptions::default());
    let result = list.settled().await;

    assert!(result.is_success());
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 4);
    // 1s + 2s + 4s
    assert!(started.elapsed() >= Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_read_fails_after_retries_run_out() {
    let h = Harness::with_client(QueryClient::new());
    for _ in 0..4 {
        h.service.fail_next(server_error());
    }

    let mut list = h.ctx.entity::<Course>().use_courses(FindArgs::new(), ReadOptions::default());
    let result = list.settled().await;

    assert!(result.is_error_courses());
    assert_eq!(result.error().and_then(AdminError::status), Some(503));
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retry_can_be_disabled_per_read() {
    let h = Harness::with_client(QueryClient::new());
    h.service.fail_next(server_error());

    let mut list = h
        .ctx
        .entity::<Course>()
        .use_courses(FindArgs::new(), ReadOptions::default().retry(0));
    let result = list.settled().await;

    assert!(result.is_error());
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 1);
}

// =============================================================================
// Freshness and Deduplication
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_request_in_flight_is_joined() {
    let h = Harness::new();
    h.service.clone().with_latency(Duration::from_millis(100));
    h.seed_courses(2);
    let courses = h.ctx.entity::<Course>();

    let mut first = courses.use_courses(FindArgs::new(), ReadOptions::default());
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut second = courses.use_courses(FindArgs::new(), ReadOptions::default());
    assert!(second.result().is_loading_courses());

    first.settled().await;
    second.settled().await;
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_time_serves_cache_until_expired() {
    let h = Harness::new();
    h.seed_courses(1);
    let courses = h.ctx.entity::<Course>();
    let options = ReadOptions::default().stale_time(Duration::from_secs(30));

    let mut first = courses.use_courses(FindArgs::new(), options.clone());
    first.settled().await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let mut fresh = courses.use_courses(FindArgs::new(), options.clone());
    fresh.settled().await;
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 1);

    tokio::time::sleep(Duration::from_secs(21)).await;
    let mut stale = courses.use_courses(FindArgs::new(), options);
    stale.settled().await;
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_refetches_fresh_data() {
    let h = Harness::new();
    h.seed_courses(1);
    let courses = h.ctx.entity::<Course>();
    let options = ReadOptions::default().stale_time(Duration::from_secs(300));

    let mut list = courses.use_courses(FindArgs::new(), options);
    list.settled().await;

    let refetched = h.ctx.client().invalidate_queries(&courses.model().keys.list()).await;
    assert_eq!(refetched, 1);
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 2);
    assert!(!h.ctx.client().get_query_state(list.key()).unwrap().is_invalidated);
}

// =============================================================================
// Garbage Collection
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unobserved_entry_is_collected_after_gc_time() {
    let h = Harness::new();
    h.seed_courses(1);
    let client = h.ctx.client().clone();

    let key = {
        let mut list = h.ctx.entity::<Course>().use_courses(FindArgs::new(), ReadOptions::default());
        list.settled().await;
        list.key().clone()
    };

    tokio::time::sleep(Duration::from_secs(4 * 60)).await;
    assert_eq!(client.collect_garbage(), 0);
    assert!(client.get_query_data(&key).is_some());

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(client.collect_garbage(), 1);
    assert!(client.get_query_state(&key).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_observed_entry_is_never_collected() {
    let h = Harness::new();
    h.seed_courses(1);
    let client = h.ctx.client().clone();

    let mut list = h.ctx.entity::<Course>().use_courses(FindArgs::new(), ReadOptions::default());
    list.settled().await;

    tokio::time::sleep(Duration::from_secs(60 * 60)).await;
    assert_eq!(client.collect_garbage(), 0);
    assert_eq!(client.observer_count(list.key()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_collector_evicts_entries() {
    let h = Harness::new();
    h.seed_courses(1);
    let client = h.ctx.client().clone();
    let collector = client.spawn_garbage_collector(Duration::from_secs(60));

    {
        let mut list = h.ctx.entity::<Course>().use_courses(FindArgs::new(), ReadOptions::default());
        list.settled().await;
    }
    assert_eq!(client.len(), 1);

    tokio::time::sleep(Duration::from_secs(7 * 60)).await;
    assert!(client.is_empty());
    collector.abort();
}

#[tokio::test(start_paused = true)]
async fn test_collected_view_fetches_again() {
    let h = Harness::new();
    h.seed_courses(1);
    let courses = h.ctx.entity::<Course>();

    {
        let mut list = courses.use_courses(FindArgs::new(), ReadOptions::default());
        list.settled().await;
    }
    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    h.ctx.client().collect_garbage();

    let list = courses.use_courses(FindArgs::new(), ReadOptions::default());
    assert!(list.result().is_loading_courses());
}
