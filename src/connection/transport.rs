//! Transport seam.
//!
//! The pool never touches sockets directly. A [`Connector`] opens links to
//! the one logical endpoint and hands back [`Transport`]s; the wire protocol
//! layer above the pool decides what the frames mean.

use std::fmt;
use std::io;

use async_trait::async_trait;

/// One open link to the server.
///
/// Implementations must allow concurrent `send` and `receive` calls, since a
/// connection carries several in-flight requests at once.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write one frame.
    async fn send(&self, frame: &[u8]) -> io::Result<()>;

    /// Read the next frame.
    async fn receive(&self) -> io::Result<Vec<u8>>;

    /// Whether the link still looks usable.
    fn is_open(&self) -> bool;

    /// Close the link. Must be safe to call more than once.
    async fn close(&self);
}

/// Opens new transports to the pool's endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> io::Result<Box<dyn Transport>>;

    /// Endpoint description used in logs and errors.
    fn endpoint(&self) -> String;
}

impl fmt::Debug for dyn Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connector({})", self.endpoint())
    }
}
