//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tcp_sink::config::{FaultConfig, SinkConfig};
use tcp_sink::{ChunkObserver, ConnectionId, ConnectionStats, Shutdown, SinkError, SinkServer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a test waits for an event that should arrive.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the server reported, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected(SocketAddr),
    Chunk(Vec<u8>),
    Closed(ConnectionStats),
    Fault(String),
}

/// Forwards every observer callback to a channel.
pub struct RecordingObserver {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChunkObserver for RecordingObserver {
    fn on_connect(&mut self, _id: ConnectionId, peer: SocketAddr) {
        let _ = self.tx.send(Event::Connected(peer));
    }

    fn on_chunk(&mut self, _id: ConnectionId, _peer: SocketAddr, chunk: &[u8]) {
        let _ = self.tx.send(Event::Chunk(chunk.to_vec()));
    }

    fn on_close(&mut self, _id: ConnectionId, _peer: SocketAddr, stats: &ConnectionStats) {
        let _ = self.tx.send(Event::Closed(*stats));
    }

    fn on_fault(&mut self, _id: ConnectionId, _peer: SocketAddr, err: &SinkError) {
        let _ = self.tx.send(Event::Fault(err.kind().to_string()));
    }
}

/// A sink running in the background on an ephemeral loopback port.
pub struct RunningSink {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub handle: JoinHandle<Result<(), SinkError>>,
}

impl RunningSink {
    /// Next event, failing the test if none arrives in time.
    pub async fn next_event(&mut self) -> Event {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for sink event")
            .expect("sink stopped reporting events")
    }

    /// Assert nothing is reported for `wait`.
    pub async fn expect_quiet(&mut self, wait: Duration) {
        if let Ok(event) = tokio::time::timeout(wait, self.events.recv()).await {
            panic!("unexpected sink event: {event:?}");
        }
    }

    /// Collect chunks until the connection closes.
    pub async fn chunks_until_closed(&mut self) -> (Vec<Vec<u8>>, ConnectionStats) {
        let mut chunks = Vec::new();
        loop {
            match self.next_event().await {
                Event::Chunk(chunk) => chunks.push(chunk),
                Event::Closed(stats) => return (chunks, stats),
                other => panic!("expected chunk or close, got {other:?}"),
            }
        }
    }

    /// Trigger shutdown and return the server's result.
    pub async fn stop(self) -> Result<(), SinkError> {
        self.shutdown.trigger();
        tokio::time::timeout(EVENT_TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

/// Bind on 127.0.0.1:0 and serve with the given fault policies.
pub fn start_sink(faults: FaultConfig) -> RunningSink {
    let mut config = SinkConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.faults = faults;

    let (tx, events) = mpsc::unbounded_channel();
    let server = SinkServer::bind(&config)
        .expect("bind sink")
        .with_observer(RecordingObserver { tx });
    let addr = server.local_addr();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run_until(shutdown.signalled()));

    RunningSink {
        addr,
        shutdown,
        events,
        handle,
    }
}
