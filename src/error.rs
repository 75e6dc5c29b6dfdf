//! Error types for the sink.
//!
//! Only a zero-length read counts as a clean end of a connection; every other
//! I/O failure surfaces here so the server can apply its fault policy.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Failures raised while binding, accepting or reading.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Could not bind the listening socket (port in use, permission denied).
    #[error("Bind failed on {}: [Errno {}] {}", .addr, errno(.source), .source)]
    Bind { addr: SocketAddr, source: io::Error },

    /// Socket creation or `listen` failed.
    #[error("Socket setup failed: {0}")]
    Socket(#[source] io::Error),

    /// `accept` returned an error.
    #[error("Accept failed: {0}")]
    Accept(#[source] io::Error),

    /// A read on an accepted connection failed (not EOF).
    #[error("Read from {peer} failed: {source}")]
    Read { peer: SocketAddr, source: io::Error },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SinkError {
    /// OS error code behind this failure, when there is one.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            SinkError::Bind { source, .. }
            | SinkError::Read { source, .. }
            | SinkError::Socket(source)
            | SinkError::Accept(source) => source.raw_os_error(),
            SinkError::Config(_) => None,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SinkError::Bind { .. } => "bind",
            SinkError::Socket(_) => "socket",
            SinkError::Accept(_) => "accept",
            SinkError::Read { .. } => "read",
            SinkError::Config(_) => "config",
        }
    }
}

fn errno(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(0)
}
