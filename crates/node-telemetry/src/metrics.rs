//! Prometheus metrics for the peer control plane.
//!
//! All metrics follow the naming convention: `relay_p2p_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Frames decoded successfully, by kind.
    pub static ref MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("relay_p2p_messages_received_total", "Peer frames decoded, by message kind"),
        &["kind"]
    ).expect("metric creation failed");

    /// Frames dropped before reaching a handler.
    pub static ref MESSAGES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("relay_p2p_messages_dropped_total", "Peer frames dropped before dispatch"),
        &["reason"]  // reason: decode/unknown_kind/unsolicited
    ).expect("metric creation failed");

    /// Handler failures, by kind and error class.
    pub static ref HANDLER_FAILURES: CounterVec = CounterVec::new(
        Opts::new("relay_p2p_handler_failures_total", "Peer message handler failures"),
        &["kind", "class"]
    ).expect("metric creation failed");

    /// Handlers currently executing.
    pub static ref HANDLERS_IN_FLIGHT: Gauge = Gauge::new(
        "relay_p2p_handlers_in_flight",
        "Peer message handlers currently executing"
    ).expect("metric creation failed");

    /// Handler wall time, by kind.
    pub static ref HANDLER_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "relay_p2p_handler_duration_seconds",
            "Time spent handling one peer message"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets")),
        &["kind"]
    ).expect("metric creation failed");

    /// Gateway master checks, by outcome.
    pub static ref ELECTIONS: CounterVec = CounterVec::new(
        Opts::new("relay_p2p_elections_total", "Gateway master checks"),
        &["outcome"]  // outcome: self_elected/remote_master/failed
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(MESSAGES_DROPPED.clone()),
        Box::new(HANDLER_FAILURES.clone()),
        Box::new(HANDLERS_IN_FLIGHT.clone()),
        Box::new(HANDLER_DURATION.clone()),
        Box::new(ELECTIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Render all registered metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
