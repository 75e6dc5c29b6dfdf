//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Honour `RUST_LOG`, falling back to the configured directive
//! - Keep the operator lines (socket milestones, connections, chunks) visible
//!   whatever `RUST_LOG` says
//!
//! # Design Decisions
//! - Human-readable fmt output on stdout
//! - Structured fields (`connection_id`, `bytes`, `peer`) ride along with messages

use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target for the lines an operator watches for. Always enabled at info.
pub const OPERATOR: &str = "tcp_sink::operator";

/// Build the filter: `RUST_LOG` or `default_directive`, plus the operator target.
pub fn filter(default_directive: &str) -> Result<EnvFilter, ParseError> {
    let operator: Directive = format!("{OPERATOR}=info").parse()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into());
    Ok(filter.add_directive(operator))
}

/// Install the global subscriber. Call once, before binding.
pub fn init(default_directive: &str) -> Result<(), ParseError> {
    tracing_subscriber::registry()
        .with(filter(default_directive)?)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}
