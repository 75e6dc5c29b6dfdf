//! Configuration validation.
//!
//! Serde handles the syntactic checks; this module covers the values serde
//! cannot judge. Returns every error found, not just the first.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::SinkConfig;

/// A single semantic problem in a [`SinkConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host {0:?} is not an IP address")]
    Host(String),

    #[error("listener.backlog must be greater than zero")]
    Backlog,

    #[error("observability.log_level {0:?} is not a valid filter directive")]
    LogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check a configuration before it is accepted.
pub fn validate_config(config: &SinkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::Host(config.listener.host.clone()));
    }

    if config.listener.backlog == 0 {
        errors.push(ValidationError::Backlog);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
