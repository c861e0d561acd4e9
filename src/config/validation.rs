//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Route the `[pool]` values through the `PoolSettings` setters
//! - Validate timing ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PoolConfig → Result<(), Vec<ValidationError>>
//! - Runs before any pool is constructed

use std::net::SocketAddr;

use crate::config::schema::PoolConfig;
use crate::config::settings::PoolSettings;
use crate::error::PoolError;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<PoolError> for ValidationError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::InvalidConfiguration { field, message } => Self::new(field, message),
            other => Self::new("pool", other.to_string()),
        }
    }
}

/// Check a loaded configuration, collecting every problem.
pub fn validate_config(config: &PoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Each setter is applied independently so all three are reported.
    let mut settings = PoolSettings::default();
    let pool = &config.pool;
    for result in [
        settings.set_pool_size(pool.pool_size),
        settings.set_max_in_process_per_connection(pool.max_in_process_per_connection),
        settings.set_get_open_connection_retries(pool.get_open_connection_retries),
    ] {
        if let Err(e) = result {
            errors.push(e.into());
        }
    }

    if config.endpoint.address.trim().is_empty() {
        errors.push(ValidationError::new("endpoint.address", "must not be empty"));
    }
    if config.endpoint.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("endpoint.connect_timeout_ms", "must be > 0"));
    }

    let acquisition = &config.acquisition;
    if acquisition.base_delay_ms == 0 {
        errors.push(ValidationError::new("acquisition.base_delay_ms", "must be > 0"));
    }
    if acquisition.max_delay_ms < acquisition.base_delay_ms {
        errors.push(ValidationError::new(
            "acquisition.max_delay_ms",
            format!(
                "must be >= base_delay_ms ({}), got {}",
                acquisition.base_delay_ms, acquisition.max_delay_ms
            ),
        ));
    }

    if config.health.interval_ms == 0 {
        errors.push(ValidationError::new("health.interval_ms", "must be > 0"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PoolConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_pool_error() {
        let mut config = PoolConfig::default();
        config.pool.pool_size = 0;
        config.pool.max_in_process_per_connection = -3;
        config.pool.get_open_connection_retries = -1;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["PoolSize", "MaxInProcessPerConnection", "GetOpenConnectionRetries"]
        );
    }

    #[test]
    fn rejects_inverted_backoff_and_zero_interval() {
        let mut config = PoolConfig::default();
        config.acquisition.base_delay_ms = 500;
        config.acquisition.max_delay_ms = 100;
        config.health.interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "acquisition.max_delay_ms"));
        assert!(errors.iter().any(|e| e.field == "health.interval_ms"));
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = PoolConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
