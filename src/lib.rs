//! Connection pool for a graph database server.
//!
//! A fixed number of long-lived connections to one endpoint, each carrying
//! up to a bounded number of concurrent requests. Callers reserve a request
//! slot with [`ConnectionPool::acquire`]; a background monitor replaces
//! connections that die.

pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod resilience;

pub use config::{PoolConfig, PoolSettings, PoolTuning};
pub use connection::{Connection, Connector, TcpConnector, Transport};
pub use error::PoolError;
pub use pool::{ConnectionPool, PoolStats, PooledConnection, ShutdownReport};
