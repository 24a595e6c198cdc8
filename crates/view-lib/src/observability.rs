//! Observability infrastructure for hierarchy views
//!
//! Provides:
//! - Prometheus metrics (flatten latency, rows emitted, stale responses, fetch failures)
//! - Structured logging of view events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for flatten latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ViewMetricsInner> = OnceLock::new();

struct ViewMetricsInner {
    flatten_latency_seconds: Histogram,
    rows_emitted: IntGauge,
    stale_responses: IntCounter,
    fetch_errors: IntCounter,
    fetch_retries: IntCounter,
}

impl ViewMetricsInner {
    fn new() -> Self {
        Self {
            flatten_latency_seconds: register_histogram!(
                "hierarchy_view_flatten_latency_seconds",
                "Time spent flattening a snapshot into chart rows",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register flatten_latency_seconds"),

            rows_emitted: register_int_gauge!(
                "hierarchy_view_rows_emitted",
                "Number of rows in the most recently built table"
            )
            .expect("Failed to register rows_emitted"),

            stale_responses: register_int_counter!(
                "hierarchy_view_stale_responses_total",
                "Responses discarded because a newer request superseded them"
            )
            .expect("Failed to register stale_responses"),

            fetch_errors: register_int_counter!(
                "hierarchy_view_fetch_errors_total",
                "Snapshot fetches that ended without data"
            )
            .expect("Failed to register fetch_errors"),

            fetch_retries: register_int_counter!(
                "hierarchy_view_fetch_retries_total",
                "Snapshot fetch attempts retried after a failure or timeout"
            )
            .expect("Failed to register fetch_retries"),
        }
    }
}

/// Handle to the process-wide view metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct ViewMetrics {
    _private: (),
}

impl Default for ViewMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ViewMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ViewMetricsInner {
        GLOBAL_METRICS.get_or_init(ViewMetricsInner::new)
    }

    pub fn observe_flatten_latency(&self, duration_secs: f64) {
        self.inner().flatten_latency_seconds.observe(duration_secs);
    }

    pub fn set_rows_emitted(&self, rows: usize) {
        self.inner().rows_emitted.set(rows as i64);
    }

    pub fn inc_stale_responses(&self) {
        self.inner().stale_responses.inc();
    }

    pub fn inc_fetch_errors(&self) {
        self.inner().fetch_errors.inc();
    }

    pub fn inc_fetch_retries(&self) {
        self.inner().fetch_retries.inc();
    }
}

/// Structured logger for view events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    view: String,
}

impl StructuredLogger {
    pub fn new(view: impl Into<String>) -> Self {
        Self { view: view.into() }
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn log_fetch_started(&self, token: u64, path: &str) {
        debug!(
            event = "fetch_started",
            view = %self.view,
            token = token,
            path = %path,
            "Requesting snapshot"
        );
    }

    pub fn log_snapshot_applied(&self, token: u64, rows: usize, filter_names: usize) {
        info!(
            event = "snapshot_applied",
            view = %self.view,
            token = token,
            rows = rows,
            filter_names = filter_names,
            "Snapshot flattened"
        );
    }

    pub fn log_no_data(&self, token: u64, reason: &str) {
        warn!(
            event = "no_data",
            view = %self.view,
            token = token,
            reason = %reason,
            "Snapshot unavailable"
        );
    }

    pub fn log_stale_response(&self, token: u64, latest: u64) {
        debug!(
            event = "stale_response",
            view = %self.view,
            token = token,
            latest = latest,
            "Discarding response from superseded request"
        );
    }

    pub fn log_fetch_retry(&self, attempt: u32, backoff_ms: u64, error: &str) {
        warn!(
            event = "fetch_retry",
            view = %self.view,
            attempt = attempt,
            backoff_ms = backoff_ms,
            error = %error,
            "Snapshot fetch failed, retrying"
        );
    }

    pub fn log_metric_change(&self, metric: &str, rows: usize) {
        info!(
            event = "metric_changed",
            view = %self.view,
            metric = %metric,
            rows = rows,
            "Rebuilt rows from original snapshot"
        );
    }

    pub fn log_graph_filtered(&self, service: &str, nodes: usize, edges: usize) {
        info!(
            event = "graph_filtered",
            view = %self.view,
            service = %service,
            nodes = nodes,
            edges = edges,
            "Filtered network graph by service"
        );
    }
}
