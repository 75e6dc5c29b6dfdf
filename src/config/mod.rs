//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SinkConfig (port filled in from the command line)
//!     → SinkServer::bind
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running without a file is the normal case
//! - The port is never read from the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{FaultConfig, FaultPolicy, ListenerConfig, ObservabilityConfig, SinkConfig};
