//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse args → Load config → Init logging → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     trigger() → accept/read loops return → sockets dropped
//! ```
//!
//! # Design Decisions
//! - Startup is fail fast: a bind error exits the process
//! - Shutdown exists for library callers and tests only; no signal handling

pub mod shutdown;

pub use shutdown::Shutdown;
