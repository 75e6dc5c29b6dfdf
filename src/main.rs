//! `tcp-sink <PORT>`: listen on all interfaces and log whatever clients send.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tcp_sink::config::{load_config, SinkConfig};
use tcp_sink::observability::{logging, metrics};
use tcp_sink::SinkServer;

#[derive(Parser)]
#[command(name = "tcp-sink", version)]
#[command(about = "Receive-only TCP endpoint that logs every chunk a client sends", long_about = None)]
struct Cli {
    /// TCP port to listen on
    port: u16,

    /// Optional TOML file with listener, fault and observability settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("tcp-sink: cannot load {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => SinkConfig::default(),
    };
    config.listener.port = cli.port;

    if let Err(err) = logging::init(&config.observability.log_level) {
        eprintln!("tcp-sink: invalid log filter: {err}");
        return ExitCode::FAILURE;
    }

    if let Some(addr) = config.observability.metrics_address.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::warn!(error = %err, "Metrics endpoint disabled");
                }
            }
            Err(err) => tracing::warn!(metrics_address = addr, error = %err, "Metrics endpoint disabled"),
        }
    }

    let server = match SinkServer::bind(&config) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(target: logging::OPERATOR, os_error_code = err.os_code(), "{err}");
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(kind = err.kind(), os_error_code = err.os_code(), "{err}");
            ExitCode::FAILURE
        }
    }
}
