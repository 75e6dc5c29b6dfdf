//! TCP listener with an explicit backlog.
//!
//! # Responsibilities
//! - Create the stream socket and bind it to the configured address
//! - Listen with a fixed backlog (10 by default)
//! - Accept one connection at a time
//!
//! The socket is closed when the [`Listener`] is dropped.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ListenerConfig;
use crate::error::SinkError;
use crate::observability::logging::OPERATOR;

/// The long-lived listening socket.
#[derive(Debug)]
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Address actually bound (resolves port 0).
    local_addr: SocketAddr,
}

impl Listener {
    /// Create, bind and listen, logging each step.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &ListenerConfig) -> Result<Self, SinkError> {
        let addr = config.socket_addr().map_err(|e| {
            SinkError::Socket(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(SinkError::Socket)?;
        tracing::info!(target: OPERATOR, "Socket created");

        socket
            .bind(addr)
            .map_err(|source| SinkError::Bind { addr, source })?;
        tracing::info!(target: OPERATOR, address = %addr, "Socket bind complete");

        let inner = socket.listen(config.backlog).map_err(SinkError::Socket)?;
        let local_addr = inner.local_addr().map_err(SinkError::Socket)?;
        tracing::info!(
            target: OPERATOR,
            address = %local_addr,
            backlog = config.backlog,
            "Socket now listening"
        );

        Ok(Self { inner, local_addr })
    }

    /// Wait for the next client.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), SinkError> {
        let (stream, peer) = self.inner.accept().await.map_err(SinkError::Accept)?;
        tracing::debug!(peer_addr = %peer, "Connection accepted");
        Ok((stream, peer))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
