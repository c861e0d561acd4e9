//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PoolConfig::pool_settings() → PoolSettings (validated, frozen)
//!     → PoolConfig::tuning()        → PoolTuning (backoff, intervals)
//!     → handed by value to ConnectionPool::connect
//! ```
//!
//! # Design Decisions
//! - Settings are copied into the pool; later mutation has no effect on it
//! - Setters validate on assignment and never clamp
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{PoolConfig, PoolTuning};
pub use settings::PoolSettings;
