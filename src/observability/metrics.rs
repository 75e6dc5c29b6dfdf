//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sink_connections_total` (counter): accepted connections
//! - `sink_chunks_received_total` (counter): non-empty reads
//! - `sink_bytes_received_total` (counter): bytes read
//! - `sink_faults_total` (counter): accept/read faults by `kind`
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("sink_connections_total", "Accepted connections");
    describe_counter!("sink_chunks_received_total", "Non-empty reads");
    describe_counter!("sink_bytes_received_total", "Bytes received from clients");
    describe_counter!("sink_faults_total", "Accept and read faults");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection() {
    counter!("sink_connections_total").increment(1);
}

pub fn record_chunk(len: usize) {
    counter!("sink_chunks_received_total").increment(1);
    counter!("sink_bytes_received_total").increment(len as u64);
}

pub fn record_fault(kind: &'static str) {
    counter!("sink_faults_total", "kind" => kind).increment(1);
}

/// Capture the counters recorded while `f` runs on this thread.
#[cfg(test)]
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, Captured) {
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let result = metrics::with_local_recorder(&recorder, f);

    let counters = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) => {
                let key = key.key();
                let labels = key
                    .labels()
                    .map(|label| (label.key().to_string(), label.value().to_string()))
                    .collect();
                Some((key.name().to_string(), labels, count))
            }
            _ => None,
        })
        .collect();

    (result, Captured { counters })
}

/// Counter values seen by [`capture`].
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct Captured {
    counters: Vec<(String, Vec<(String, String)>, u64)>,
}

#[cfg(test)]
impl Captured {
    pub(crate) fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.counters
            .iter()
            .find(|(n, l, _)| {
                n == name
                    && l.len() == labels.len()
                    && labels.iter().all(|(k, v)| l.iter().any(|(lk, lv)| lk == k && lv == v))
            })
            .map(|(_, _, count)| *count)
    }
}
