//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, outcome
//! - `proxy_request_duration_seconds` (histogram): latency by outcome
//! - `proxy_upstream_failures_total` (counter): failed fetches by kind
//! - `proxy_rewritten_references_total` (counter): rewritten references by kind
//!
//! # Design Decisions
//! - Prometheus exporter owns its own HTTP listener
//! - Label values are small closed sets

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::UpstreamFailure;

/// How a proxied request concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// HTML body rewritten before delivery.
    Rewritten,
    /// Body relayed as received.
    Streamed,
    /// HTML relayed untouched because it exceeded the rewrite buffer.
    Oversized,
    /// Target could not be resolved.
    ResolutionFault,
    /// The upstream fetch failed.
    UpstreamFault,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Rewritten => "rewritten",
            Outcome::Streamed => "streamed",
            Outcome::Oversized => "oversized",
            Outcome::ResolutionFault => "resolution_fault",
            Outcome::UpstreamFault => "upstream_fault",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus exporter");
        }
    }
}

fn describe_metrics() {
    describe_counter!("proxy_requests_total", "Proxied requests by method, status and outcome");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "End-to-end proxy latency in seconds"
    );
    describe_counter!("proxy_upstream_failures_total", "Failed upstream fetches by kind");
    describe_counter!(
        "proxy_rewritten_references_total",
        "References rewritten to route through the proxy"
    );
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, outcome: Outcome, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(kind: UpstreamFailure) {
    counter!("proxy_upstream_failures_total", "kind" => kind.as_str()).increment(1);
}

/// Record rewritten references; `kind` is `attribute` or `css`.
pub fn record_rewritten(kind: &'static str, count: usize) {
    if count > 0 {
        counter!("proxy_rewritten_references_total", "kind" => kind).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Rewritten.as_str(), "rewritten");
        assert_eq!(Outcome::ResolutionFault.as_str(), "resolution_fault");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_request("GET", 200, Outcome::Streamed, Instant::now());
        record_upstream_failure(UpstreamFailure::Connect);
        record_rewritten("css", 0);
    }
}
