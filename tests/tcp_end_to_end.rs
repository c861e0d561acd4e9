//! Pool over real TCP links to a local echo server.

use std::time::Duration;

use graph_pool::config::parse_config;
use graph_pool::{ConnectionPool, PoolError, TcpConnector};

mod common;

use common::{fast_tuning, settings, start_echo_server};

#[tokio::test]
async fn test_requests_round_trip_over_tcp() {
    let addr = start_echo_server().await;
    let connector = TcpConnector::new(addr.to_string());
    let pool = ConnectionPool::connect(settings(2, 1, 2), fast_tuning(), connector).await;

    let stats = pool.stats();
    assert_eq!(stats.open_connections, 2);
    assert_eq!(stats.endpoint, addr.to_string());

    for query in ["g.V().count()", "g.E().limit(1)", "g.V().has('name','marko')"] {
        let conn = pool.acquire().await.unwrap();
        conn.send(query.as_bytes()).await.unwrap();
        assert_eq!(conn.receive().await.unwrap(), query.as_bytes());
    }

    let report = pool.shutdown(Duration::from_millis(200)).await;
    assert_eq!(report.closed_connections, 2);
}

#[tokio::test]
async fn test_pool_from_config_file() {
    let addr = start_echo_server().await;
    let config = parse_config(&format!(
        r#"
[endpoint]
address = "{addr}"
connect_timeout_ms = 500

[pool]
pool_size = 2
max_in_process_per_connection = 4
get_open_connection_retries = 1

[health]
interval_ms = 50
"#
    ))
    .unwrap();

    let pool = ConnectionPool::from_config(&config).await.unwrap();
    assert_eq!(pool.settings().pool_size(), 2);
    assert_eq!(pool.settings().max_in_process_per_connection(), 4);

    let conn = pool.acquire().await.unwrap();
    conn.send(b"ping").await.unwrap();
    assert_eq!(conn.receive().await.unwrap(), b"ping");
    drop(conn);

    pool.shutdown(config.drain_timeout()).await;
}

#[tokio::test]
async fn test_unreachable_tcp_endpoint_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let connector = TcpConnector::new(addr.to_string());
    let pool = ConnectionPool::connect(settings(1, 1, 0), fast_tuning(), connector).await;

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, PoolError::ServerUnavailable { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn test_shutdown_is_bounded_with_stalled_peer() {
    let addr = common::start_stalled_server().await;
    let pool = ConnectionPool::connect(
        settings(1, 2, 0),
        fast_tuning(),
        TcpConnector::new(addr.to_string()),
    )
    .await;
    assert_eq!(pool.stats().open_connections, 1);

    // The peer never reads, so this send fills the socket buffers and blocks.
    let guard = pool.acquire().await.unwrap();
    let pending = tokio::spawn(async move { guard.send(&vec![0u8; 32 * 1024 * 1024]).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished());

    let report = tokio::time::timeout(Duration::from_secs(3), pool.shutdown(Duration::from_millis(50)))
        .await
        .expect("shutdown did not finish after its drain timeout");
    assert!(!report.drained);
    assert_eq!(report.closed_connections, 1);

    let send = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(send, Err(PoolError::Transport(_))));
}

#[tokio::test]
async fn test_monitor_keeps_healing_with_stalled_peer() {
    let addr = common::start_stalled_server().await;
    let pool = ConnectionPool::connect(
        settings(2, 2, 0),
        fast_tuning(),
        TcpConnector::new(addr.to_string()),
    )
    .await;

    let guard = pool.acquire().await.unwrap();
    let stalled = guard.connection().clone();
    let _pending = tokio::spawn(async move { guard.send(&vec![0u8; 32 * 1024 * 1024]).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The sweep evicts the stalled link while its writer is busy, then
    // reconnects the slot.
    stalled.mark_dead();
    let pool_ref = &pool;
    let healed = common::eventually(Duration::from_secs(3), move || async move {
        let stats = pool_ref.stats();
        stats.open_connections == 2 && stats.reconnects_total >= 1
    })
    .await;
    assert!(healed, "monitor stalled: {:?}", pool.stats());
}
