//! Prometheus metrics for the credential client.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`]; an embedding application
//! can expose [`ClientMetrics::encode_text`] on its own `/metrics` route.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

pub struct ClientMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Endpoint connection attempts, one per endpoint tried.
    pub connect_attempts: IntCounter,
    /// Endpoint attempts that failed to connect or become ready.
    pub connect_failures: IntCounter,
    /// Signed operations handed to the chain.
    pub transactions_submitted: IntCounter,
    /// Operations finalized without a dispatch error.
    pub transactions_finalized: IntCounter,
    /// Operations that settled with an error, cancellations excluded.
    pub transactions_failed: IntCounter,
    /// Operations the wallet user declined to sign.
    pub transactions_cancelled: IntCounter,
    /// Records dropped from a listing because they could not be read or decoded.
    pub records_skipped: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// 1 while a ready connection is held.
    pub connected: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Submission to finality, in milliseconds.
    pub finality_latency_ms: Histogram,
}

impl ClientMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let connect_attempts = register_int_counter_with_registry!(
            Opts::new("forge_connect_attempts_total", "Endpoint connection attempts"),
            registry
        )
        .expect("failed to register connect_attempts counter");

        let connect_failures = register_int_counter_with_registry!(
            Opts::new(
                "forge_connect_failures_total",
                "Endpoint connection attempts that failed"
            ),
            registry
        )
        .expect("failed to register connect_failures counter");

        let transactions_submitted = register_int_counter_with_registry!(
            Opts::new(
                "forge_transactions_submitted_total",
                "Signed credential operations submitted"
            ),
            registry
        )
        .expect("failed to register transactions_submitted counter");

        let transactions_finalized = register_int_counter_with_registry!(
            Opts::new(
                "forge_transactions_finalized_total",
                "Credential operations finalized successfully"
            ),
            registry
        )
        .expect("failed to register transactions_finalized counter");

        let transactions_failed = register_int_counter_with_registry!(
            Opts::new(
                "forge_transactions_failed_total",
                "Credential operations that failed"
            ),
            registry
        )
        .expect("failed to register transactions_failed counter");

        let transactions_cancelled = register_int_counter_with_registry!(
            Opts::new(
                "forge_transactions_cancelled_total",
                "Credential operations cancelled in the wallet"
            ),
            registry
        )
        .expect("failed to register transactions_cancelled counter");

        let records_skipped = register_int_counter_with_registry!(
            Opts::new(
                "forge_records_skipped_total",
                "Credential records skipped while listing"
            ),
            registry
        )
        .expect("failed to register records_skipped counter");

        let connected = register_int_gauge_with_registry!(
            Opts::new("forge_connected", "Whether a chain connection is held"),
            registry
        )
        .expect("failed to register connected gauge");

        // 50 ms → ~7 min; finality on a live chain takes tens of seconds.
        let finality_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "forge_finality_latency_ms",
                "Time from submission to finality in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(50.0, 2.0, 14).unwrap()),
            registry
        )
        .expect("failed to register finality_latency_ms histogram");

        Self {
            registry,
            connect_attempts,
            connect_failures,
            transactions_submitted,
            transactions_finalized,
            transactions_failed,
            transactions_cancelled,
            records_skipped,
            connected,
            finality_latency_ms,
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
