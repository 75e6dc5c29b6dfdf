//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener / connection / server
//!     → logging.rs (tracing events on stdout)
//!     → metrics.rs (counters, optional Prometheus endpoint)
//! ```

pub mod logging;
pub mod metrics;
