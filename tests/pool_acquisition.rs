//! Acquisition behaviour against an in-memory server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use graph_pool::config::PoolTuning;
use graph_pool::resilience::backoff::Backoff;
use graph_pool::{ConnectionPool, PoolError};

mod common;

use common::{fast_tuning, settings, MockServer};

#[tokio::test]
async fn test_zero_retries_fails_fast_when_saturated() {
    let server = MockServer::new();
    let pool = ConnectionPool::connect(settings(1, 1, 0), fast_tuning(), server.connector()).await;

    let held = pool.acquire().await.unwrap();
    assert_eq!(held.in_flight(), 1);

    let start = Instant::now();
    let err = pool.acquire().await.unwrap_err();
    assert!(
        matches!(err, PoolError::PoolBusy { attempts: 1, pool_size: 1, max_in_process: 1 }),
        "unexpected error: {err}"
    );
    assert!(start.elapsed() < Duration::from_millis(50));

    pool.release(held);
    assert!(pool.acquire().await.is_ok());
}

#[tokio::test]
async fn test_succeeds_after_release_during_backoff() {
    let server = MockServer::new();
    let tuning = PoolTuning {
        backoff: Backoff::new(20, 20).with_jitter(false),
        ..fast_tuning()
    };
    let pool = ConnectionPool::connect(settings(1, 1, 4), tuning, server.connector()).await;

    let held = pool.acquire().await.unwrap();
    let release = async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);
    };

    let (acquired, _) = tokio::join!(pool.acquire(), release);
    let guard = acquired.unwrap();
    assert_eq!(guard.in_flight(), 1);
}

#[tokio::test]
async fn test_third_request_waits_for_capacity() {
    let server = MockServer::new();
    let pool = ConnectionPool::connect(settings(2, 1, 1), fast_tuning(), server.connector()).await;

    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();
    assert_ne!(first.id(), second.id());

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, PoolError::PoolBusy { attempts: 2, .. }), "unexpected error: {err}");

    drop(first);
    let third = pool.acquire().await.unwrap();
    assert_eq!(third.in_flight(), 1);
    assert_eq!(pool.stats().busy_total, 1);
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let server = MockServer::new();
    let tuning = PoolTuning {
        backoff: Backoff::new(2, 10),
        ..fast_tuning()
    };
    let pool = Arc::new(
        ConnectionPool::connect(settings(2, 3, 20), tuning, server.connector()).await,
    );
    let max_seen = Arc::new(AtomicUsize::new(0));
    let successes = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..24 {
        let pool = pool.clone();
        let max_seen = max_seen.clone();
        let successes = successes.clone();
        tasks.push(tokio::spawn(async move {
            if let Ok(guard) = pool.acquire().await {
                max_seen.fetch_max(guard.in_flight(), Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                guard.send(b"g.V()").await.unwrap();
                successes.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(max_seen.load(Ordering::SeqCst) <= 3);
    assert!(successes.load(Ordering::SeqCst) > 0);

    let stats = pool.stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.acquired_total as usize, successes.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_least_loaded_spreads_requests() {
    let server = MockServer::new();
    let pool = ConnectionPool::connect(settings(3, 4, 0), fast_tuning(), server.connector()).await;

    let guards: Vec<_> = futures_util::future::join_all((0..3).map(|_| pool.acquire()))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let mut slots: Vec<_> = guards.iter().map(|g| g.slot()).collect();
    slots.sort_unstable();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_acquire_timeout_bounds_wait() {
    let server = MockServer::new();
    let tuning = PoolTuning {
        backoff: Backoff::new(1_000, 1_000),
        ..fast_tuning()
    };
    let pool = ConnectionPool::connect(settings(1, 1, 10), tuning, server.connector()).await;

    let _held = pool.acquire().await.unwrap();
    let err = pool
        .acquire_timeout(Duration::from_millis(30))
        .await
        .unwrap_err();
    assert!(matches!(err, PoolError::AcquireTimeout(_)));
    assert_eq!(pool.stats().in_flight, 1);
}

#[tokio::test]
async fn test_release_restores_in_flight() {
    let server = MockServer::new();
    let pool = ConnectionPool::connect(settings(1, 8, 0), fast_tuning(), server.connector()).await;

    let a = pool.acquire().await.unwrap();
    let before = pool.stats().in_flight;

    let b = pool.acquire().await.unwrap();
    assert_eq!(pool.stats().in_flight, before + 1);
    pool.release(b);
    assert_eq!(pool.stats().in_flight, before);

    drop(a);
    assert_eq!(pool.stats().in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_large_pool_under_concurrent_acquire() {
    let server = MockServer::new();
    let pool = Arc::new(
        ConnectionPool::connect(settings(64, 2, 3), fast_tuning(), server.connector()).await,
    );

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                if let Ok(guard) = pool.acquire().await {
                    assert!(guard.in_flight() <= 2);
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.acquired_total, 16 * 200);
}
