//! Shared utilities for pool integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use graph_pool::config::PoolTuning;
use graph_pool::pool::SelectionStrategy;
use graph_pool::resilience::backoff::Backoff;
use graph_pool::{Connector, PoolSettings, Transport};

/// In-memory server whose availability the test controls.
#[derive(Debug, Default)]
pub struct MockServer {
    down: AtomicBool,
    connects: AtomicUsize,
    links: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_up(&self, up: bool) {
        self.down.store(!up, Ordering::SeqCst);
    }

    /// Successful connects so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Break every link opened so far.
    pub fn kill_all(&self) {
        for link in self.links.lock().unwrap().iter() {
            link.store(false, Ordering::SeqCst);
        }
    }

    pub fn connector(self: &Arc<Self>) -> MockConnector {
        MockConnector {
            server: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    server: Arc<MockServer>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        if self.server.down.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "mock server down"));
        }
        let open = Arc::new(AtomicBool::new(true));
        self.server.links.lock().unwrap().push(open.clone());
        self.server.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport { open }))
    }

    fn endpoint(&self) -> String {
        "mock:8182".to_string()
    }
}

/// Link that answers every frame with `ok` while open.
pub struct MockTransport {
    open: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, _frame: &[u8]) -> io::Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock link closed"));
        }
        Ok(())
    }

    async fn receive(&self) -> io::Result<Vec<u8>> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "mock link closed"));
        }
        Ok(b"ok".to_vec())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

pub fn settings(pool_size: i64, max_in_process: i64, retries: i64) -> PoolSettings {
    PoolSettings::new(pool_size, max_in_process, retries).unwrap()
}

/// Short delays so tests finish quickly.
pub fn fast_tuning() -> PoolTuning {
    PoolTuning {
        backoff: Backoff::new(5, 20).with_jitter(false),
        strategy: SelectionStrategy::LeastLoaded,
        monitor_interval: Duration::from_millis(20),
        connect_timeout: Duration::from_millis(200),
    }
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Start a TCP server that echoes length-prefixed frames back.
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        loop {
                            let len = match socket.read_u32().await {
                                Ok(len) => len,
                                Err(_) => break,
                            };
                            let mut buf = vec![0u8; len as usize];
                            if socket.read_exact(&mut buf).await.is_err() {
                                break;
                            }
                            if socket.write_u32(len).await.is_err()
                                || socket.write_all(&buf).await.is_err()
                            {
                                break;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a TCP server that accepts connections and never reads from them.
pub async fn start_stalled_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}
