//! The accept-then-drain loop.
//!
//! # Responsibilities
//! - Own the listening socket for the life of the server
//! - Accept one connection, drain it to EOF, then accept the next
//! - Apply the configured fault policy to accept and read errors
//!
//! Connections are strictly serialized: while one is open, later clients wait
//! in the OS backlog.

use std::future::{self, Future};
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::{validation::validate_config, ConfigError, FaultConfig, FaultPolicy, SinkConfig};
use crate::error::SinkError;
use crate::net::connection::{ChunkObserver, CloseReason, Connection, LoggingObserver};
use crate::net::listener::Listener;
use crate::observability::metrics;

/// Pause after an absorbed accept fault so a persistent one (e.g. EMFILE)
/// does not spin.
const ACCEPT_FAULT_PAUSE: Duration = Duration::from_millis(50);

/// Receive-only TCP server.
pub struct SinkServer<O = LoggingObserver> {
    listener: Listener,
    faults: FaultConfig,
    observer: O,
}

impl SinkServer<LoggingObserver> {
    /// Validate the configuration, then create, bind and listen.
    pub fn bind(config: &SinkConfig) -> Result<Self, SinkError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let listener = Listener::bind(&config.listener)?;

        Ok(Self {
            listener,
            faults: config.faults,
            observer: LoggingObserver,
        })
    }
}

impl<O> SinkServer<O>
where
    O: ChunkObserver,
{
    /// Replace the observer that receives connection events.
    pub fn with_observer<P: ChunkObserver>(self, observer: P) -> SinkServer<P> {
        SinkServer {
            listener: self.listener,
            faults: self.faults,
            observer,
        }
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Serve until the process is killed or a fault terminates the loop.
    pub async fn run(self) -> Result<(), SinkError> {
        self.run_until(future::pending()).await
    }

    /// Serve until `shutdown` resolves. An open connection is closed
    /// without waiting for EOF.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), SinkError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    on_accept_fault(self.faults.accept, err).await?;
                    continue;
                }
            };

            let connection = Connection::new(stream, peer);
            let id = connection.id();
            metrics::record_connection();
            self.observer.on_connect(id, peer);

            match connection.drain(&mut self.observer, &mut shutdown).await {
                Ok(drained) => {
                    self.observer.on_close(id, peer, &drained.stats);
                    if drained.reason == CloseReason::Shutdown {
                        break;
                    }
                }
                Err(err) => {
                    self.observer.on_fault(id, peer, &err);
                    absorb(self.faults.read, err)?;
                }
            }
        }

        tracing::info!(address = %self.local_addr(), "Listener closing");
        Ok(())
    }
}

/// Apply the accept policy; an absorbed fault pauses before the next accept.
async fn on_accept_fault(policy: FaultPolicy, err: SinkError) -> Result<(), SinkError> {
    absorb(policy, err)?;
    tokio::time::sleep(ACCEPT_FAULT_PAUSE).await;
    Ok(())
}

/// Count the fault, then either hand it back or swallow it.
fn absorb(policy: FaultPolicy, err: SinkError) -> Result<(), SinkError> {
    metrics::record_fault(err.kind());

    match policy {
        FaultPolicy::Terminate => Err(err),
        FaultPolicy::Continue => {
            tracing::warn!(kind = err.kind(), error = %err, "Fault absorbed, still accepting");
            Ok(())
        }
    }
}
