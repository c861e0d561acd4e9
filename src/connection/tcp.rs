//! TCP transport with length-prefixed frames.
//!
//! Frames are a big-endian `u32` length followed by the payload. The two
//! socket halves sit behind separate async mutexes so a send never waits on
//! a pending receive. Closing cancels pending I/O, so a peer that stops
//! reading cannot hold `close` hostage.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::connection::transport::{Connector, Transport};
use crate::lifecycle::Shutdown;

/// Frames larger than this are treated as a corrupt stream.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// How long `close` waits for the writer to hand back the socket for an
/// orderly shutdown.
const WRITER_RELEASE_TIMEOUT: Duration = Duration::from_millis(200);

/// Opens TCP links to a single `host:port`.
///
/// Connect deadlines are applied by the caller (the pool bounds every
/// connect with its configured timeout).
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        let stream = TcpStream::connect(&self.address).await?;
        stream.set_nodelay(true)?;

        tracing::debug!(address = %self.address, "TCP link established");
        Ok(Box::new(TcpTransport::new(stream)))
    }

    fn endpoint(&self) -> String {
        self.address.clone()
    }
}

/// A framed TCP link.
#[derive(Debug)]
pub struct TcpTransport {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    open: AtomicBool,
    closing: Shutdown,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            open: AtomicBool::new(true),
            closing: Shutdown::new(),
        }
    }

    fn fail<T>(&self, err: io::Error) -> io::Result<T> {
        self.open.store(false, Ordering::Release);
        Err(err)
    }

    fn aborted() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionAborted, "transport closed")
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        let len = u32::try_from(frame.len())
            .ok()
            .filter(|len| *len as usize <= MAX_FRAME_LEN)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;

        let mut closing = self.closing.subscribe();
        if closing.is_triggered() {
            return Err(Self::aborted());
        }

        let write = async {
            let mut writer = self.writer.lock().await;
            writer.write_u32(len).await?;
            writer.write_all(frame).await?;
            writer.flush().await
        };

        let result = tokio::select! {
            result = write => result,
            _ = closing.recv() => Err(Self::aborted()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    async fn receive(&self) -> io::Result<Vec<u8>> {
        let mut closing = self.closing.subscribe();
        if closing.is_triggered() {
            return Err(Self::aborted());
        }

        let read = async {
            let mut reader = self.reader.lock().await;
            let len = reader.read_u32().await? as usize;
            if len > MAX_FRAME_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("frame length {} exceeds limit", len),
                ));
            }
            let mut payload = vec![0u8; len];
            reader.read_exact(&mut payload).await?;
            Ok(payload)
        };

        let result = tokio::select! {
            result = read => result,
            _ = closing.recv() => Err(Self::aborted()),
        };

        match result {
            Ok(payload) => Ok(payload),
            Err(e) => self.fail(e),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::Release);
        if !self.closing.trigger() {
            return;
        }

        // Pending sends observe the trigger and drop the writer lock.
        match tokio::time::timeout(WRITER_RELEASE_TIMEOUT, self.writer.lock()).await {
            Ok(mut writer) => {
                let _ = writer.shutdown().await;
            }
            Err(_) => tracing::debug!("Writer still busy at close, leaving socket to drop"),
        }
    }
}
