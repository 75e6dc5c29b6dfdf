//! Per-connection reader loop.
//!
//! # Responsibilities
//! - Generate unique connection IDs for log correlation
//! - Read fixed-size chunks until the peer closes its write side
//! - Report every chunk to a [`ChunkObserver`]
//! - Release the socket on every exit path (EOF, fault, shutdown)
//!
//! Nothing is ever written back to the peer.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

use crate::error::SinkError;
use crate::observability::logging::OPERATOR;
use crate::observability::metrics;

/// Upper bound on a single read.
pub const READ_CHUNK_SIZE: usize = 2048;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier, shown as `conn-N` in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Totals for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub bytes: u64,
    pub chunks: u64,
}

impl ConnectionStats {
    fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        self.chunks += 1;
    }
}

/// Result of a single successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes arrived.
    Data(usize),
    /// Zero-length read: the peer closed its write side.
    Closed,
}

impl ReadOutcome {
    /// Classify the length returned by a stream read.
    pub fn from_len(len: usize) -> Self {
        if len == 0 {
            ReadOutcome::Closed
        } else {
            ReadOutcome::Data(len)
        }
    }
}

/// Why the reader loop stopped without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    Shutdown,
}

/// Returned by [`Connection::drain`] once the socket has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    pub reason: CloseReason,
    pub stats: ConnectionStats,
}

/// Receives connection lifecycle events.
pub trait ChunkObserver {
    fn on_connect(&mut self, id: ConnectionId, peer: SocketAddr);

    fn on_chunk(&mut self, id: ConnectionId, peer: SocketAddr, chunk: &[u8]);

    fn on_close(&mut self, id: ConnectionId, peer: SocketAddr, stats: &ConnectionStats);

    fn on_fault(&mut self, _id: ConnectionId, _peer: SocketAddr, _err: &SinkError) {}
}

/// Writes every event to the log.
///
/// Chunks are logged with `escape_ascii`, so any byte the client sent can be
/// read back from the line (`\xff`, `\n`, `\\`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl ChunkObserver for LoggingObserver {
    fn on_connect(&mut self, id: ConnectionId, peer: SocketAddr) {
        tracing::info!(
            target: OPERATOR,
            connection_id = %id,
            "Connected with {}:{}",
            peer.ip(),
            peer.port()
        );
    }

    fn on_chunk(&mut self, id: ConnectionId, _peer: SocketAddr, chunk: &[u8]) {
        tracing::info!(
            target: OPERATOR,
            connection_id = %id,
            bytes = chunk.len(),
            "Received: {}",
            chunk.escape_ascii()
        );
    }

    fn on_close(&mut self, id: ConnectionId, peer: SocketAddr, stats: &ConnectionStats) {
        tracing::info!(
            target: OPERATOR,
            connection_id = %id,
            peer = %peer,
            bytes = stats.bytes,
            chunks = stats.chunks,
            "Connection closed"
        );
    }

    fn on_fault(&mut self, id: ConnectionId, peer: SocketAddr, err: &SinkError) {
        tracing::warn!(connection_id = %id, peer = %peer, error = %err, "Connection fault");
    }
}

/// An accepted connection, owned by the reader loop.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    id: ConnectionId,
    peer: SocketAddr,
    stream: S,
    stats: ConnectionStats,
}

impl<S> Connection<S>
where
    S: AsyncRead + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::next(),
            peer,
            stream,
            stats: ConnectionStats::default(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Read until EOF, reporting each chunk.
    ///
    /// Consumes the connection, so the stream is closed whichever way this
    /// returns. `shutdown` is raced against every read.
    pub async fn drain<O, F>(
        mut self,
        observer: &mut O,
        shutdown: &mut F,
    ) -> Result<Drained, SinkError>
    where
        O: ChunkObserver + ?Sized,
        F: Future<Output = ()> + Unpin,
    {
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = tokio::select! {
                _ = &mut *shutdown => {
                    return Ok(Drained { reason: CloseReason::Shutdown, stats: self.stats });
                }
                read = self.stream.read(&mut buf) => read,
            };

            let len = read.map_err(|source| SinkError::Read {
                peer: self.peer,
                source,
            })?;

            match ReadOutcome::from_len(len) {
                ReadOutcome::Data(n) => {
                    self.stats.record(n);
                    metrics::record_chunk(n);
                    observer.on_chunk(self.id, self.peer, &buf[..n]);
                }
                ReadOutcome::Closed => {
                    return Ok(Drained { reason: CloseReason::PeerClosed, stats: self.stats });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future;

    use super::*;

    #[derive(Default)]
    struct Collect {
        chunks: Vec<Vec<u8>>,
    }

    impl ChunkObserver for Collect {
        fn on_connect(&mut self, _: ConnectionId, _: SocketAddr) {}

        fn on_chunk(&mut self, _: ConnectionId, _: SocketAddr, chunk: &[u8]) {
            self.chunks.push(chunk.to_vec());
        }

        fn on_close(&mut self, _: ConnectionId, _: SocketAddr, _: &ConnectionStats) {}
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn connection_ids_are_unique() {
        let first = Connection::new(&b""[..], peer());
        let second = Connection::new(&b""[..], peer());
        assert_ne!(first.id(), second.id());
        assert!(first.id().to_string().starts_with("conn-"));
    }

    #[test]
    fn zero_length_read_means_closed() {
        assert_eq!(ReadOutcome::from_len(0), ReadOutcome::Closed);
        assert_eq!(ReadOutcome::from_len(1), ReadOutcome::Data(1));
        assert_eq!(ReadOutcome::from_len(READ_CHUNK_SIZE), ReadOutcome::Data(READ_CHUNK_SIZE));
    }

    #[tokio::test]
    async fn splits_large_payload_at_chunk_size() {
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut observer = Collect::default();

        let drained = Connection::new(payload.as_slice(), peer())
            .drain(&mut observer, &mut future::pending())
            .await
            .unwrap();

        let sizes: Vec<usize> = observer.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2048, 2048, 904]);
        assert_eq!(observer.chunks.concat(), payload);
        assert_eq!(drained.reason, CloseReason::PeerClosed);
        assert_eq!(drained.stats, ConnectionStats { bytes: 5000, chunks: 3 });
    }

    #[test]
    fn draining_records_chunk_and_byte_counters() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let payload = vec![b'x'; 5000];

        let (drained, captured) = metrics::capture(|| {
            runtime.block_on(
                Connection::new(payload.as_slice(), peer())
                    .drain(&mut Collect::default(), &mut future::pending()),
            )
        });

        assert_eq!(drained.unwrap().stats.chunks, 3);
        assert_eq!(captured.counter("sink_chunks_received_total", &[]), Some(3));
        assert_eq!(captured.counter("sink_bytes_received_total", &[]), Some(5000));
    }

    #[tokio::test]
    async fn empty_stream_closes_without_chunks() {
        let mut observer = Collect::default();
        let drained = Connection::new(&b""[..], peer())
            .drain(&mut observer, &mut future::pending())
            .await
            .unwrap();

        assert!(observer.chunks.is_empty());
        assert_eq!(drained.stats, ConnectionStats::default());
    }

    #[tokio::test]
    async fn shutdown_interrupts_idle_read() {
        let (_client, server) = tokio::io::duplex(64);
        let mut observer = Collect::default();

        let drained = Connection::new(server, peer())
            .drain(&mut observer, &mut future::ready(()))
            .await
            .unwrap();

        assert_eq!(drained.reason, CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn reports_chunks_in_order_until_eof() {
        use tokio::io::AsyncWriteExt;

        let (mut client, server) = tokio::io::duplex(64);
        let reader = tokio::spawn(async move {
            let mut observer = Collect::default();
            Connection::new(server, peer())
                .drain(&mut observer, &mut future::pending())
                .await
                .map(|drained| (observer.chunks.concat(), drained))
        });

        for part in [&b"one "[..], b"two ", b"three"] {
            client.write_all(part).await.unwrap();
            tokio::task::yield_now().await;
        }
        drop(client);

        let (received, drained) = reader.await.unwrap().unwrap();
        assert_eq!(received, b"one two three");
        assert_eq!(drained.stats.bytes, 13);
    }
}
