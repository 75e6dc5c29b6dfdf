//! tcp-sink: a receive-only TCP endpoint for exercising clients.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client bytes        ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ net::listener ──▶ net::connection          │
//!                         │   (accept, one      (read ≤ 2048 bytes,      │
//!                         │    at a time)        until EOF)              │
//!                         │        ▲                  │                  │
//!                         │        └──── closed ◀─────┘                  │
//!                         │                           │                  │
//!                         │                           ▼                  │
//!                         │                     ChunkObserver            │
//!                         │                     (log / metrics)          │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! Nothing is ever written back to a client.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::SinkConfig;
pub use error::SinkError;
pub use lifecycle::Shutdown;
pub use net::connection::{ChunkObserver, ConnectionId, ConnectionStats, LoggingObserver, READ_CHUNK_SIZE};
pub use server::SinkServer;
