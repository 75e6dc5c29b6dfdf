//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file. Every
//! field has a default so the sink runs with no file at all.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Pending-connection queue length handed to `listen`.
pub const DEFAULT_BACKLOG: u32 = 10;

/// Root configuration for the sink.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// Listening socket settings.
    pub listener: ListenerConfig,

    /// What to do when accept or read fails.
    pub faults: FaultConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Local address to bind; `0.0.0.0` means all interfaces.
    pub host: String,

    /// Port to bind. Always taken from the command line.
    #[serde(skip)]
    pub port: u16,

    /// Backlog passed to `listen`.
    pub backlog: u32,
}

impl ListenerConfig {
    /// Combine host and port into the address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

/// Whether a fault stops the server or is logged and skipped.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Propagate the error out of the accept loop.
    #[default]
    Terminate,
    /// Log the error, drop the affected connection, keep accepting.
    Continue,
}

/// Fault policies for the two places the loops can fail.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FaultConfig {
    pub accept: FaultPolicy,
    pub read: FaultPolicy,
}

impl FaultConfig {
    /// Keep serving through both accept and read faults.
    pub fn hardened() -> Self {
        Self {
            accept: FaultPolicy::Continue,
            read: FaultPolicy::Continue,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Prometheus scrape address. Metrics are not exported when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "tcp_sink=info".to_string(),
            metrics_address: None,
        }
    }
}
