//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (socket, bind, listen backlog 10, accept)
//!     → connection.rs (read 2048-byte chunks until EOF, report each)
//!     → socket dropped, back to accept
//!
//! Connection States:
//!     Accepted → Reading → Closed
//! ```
//!
//! # Design Decisions
//! - One connection at a time; the OS backlog is the only queue
//! - A zero-length read is the only clean end of a connection
//! - Receive-only: no write path exists

pub mod connection;
pub mod listener;
