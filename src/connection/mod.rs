//! Connection subsystem.
//!
//! # Data Flow
//! ```text
//! Connector::connect (transport.rs, tcp.rs)
//!     → Box<dyn Transport>
//!     → Connection (connection.rs): in-flight counter + liveness
//!     → placed into a pool slot
//!
//! Request on a reserved connection:
//!     → Connection::send / receive → Transport
//!     → I/O error marks the connection dead for the health monitor
//! ```
//!
//! # Design Decisions
//! - Admission is a lock-free CAS on the in-flight counter
//! - "Full" is a normal signal, not an error
//! - Wire protocol and handshakes live above this layer

#[allow(clippy::module_inception)]
pub mod connection;
pub mod tcp;
pub mod transport;

pub use connection::{Connection, ConnectionId, SlotReservation};
pub use tcp::{TcpConnector, TcpTransport};
pub use transport::{Connector, Transport};
