//! Dispatch metrics
//!
//! OpenTelemetry instruments recorded by the dispatcher when observability
//! is configured on the builder. All names are prefixed `jrpc.dispatch.*`.
//!
//! - **requests_total**: dispatched envelopes, by method and status (counter)
//! - **request_duration**: dispatch latency in seconds, by method and status (histogram)
//! - **batch_size**: batch lengths, by processing mode (histogram)
//! - **notifications_total**: notifications whose outcome was discarded (counter)
//! - **errors_total**: error outcomes, by JSON-RPC code (counter)
//!
//! ```rust,no_run
//! use jrpc_dispatch::DispatchMetrics;
//!
//! let metrics = DispatchMetrics::new("calculator");
//! metrics.record_request("sum", "success", 0.002);
//! metrics.record_error(-32601);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Instruments for the dispatch pipeline
pub struct DispatchMetrics {
    pub requests_total: Counter<u64>,
    /// Seconds from receipt to completion of one envelope
    pub request_duration: Histogram<f64>,
    pub batch_size: Histogram<u64>,
    pub notifications_total: Counter<u64>,
    /// Error outcomes, whether or not a response was sent
    pub errors_total: Counter<u64>,
}

impl DispatchMetrics {
    /// Create instruments on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jrpc.dispatch.requests.total")
                .with_description("Total number of request envelopes dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("jrpc.dispatch.request.duration")
                .with_description("Dispatch duration in seconds")
                .with_unit("s")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.dispatch.batch.size")
                .with_description("Number of envelopes in batch requests")
                .build(),
            notifications_total: meter
                .u64_counter("jrpc.dispatch.notifications.total")
                .with_description("Total number of notifications dispatched")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.dispatch.errors.total")
                .with_description("Total number of error outcomes")
                .build(),
        }
    }

    /// Record one dispatched envelope
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record a batch and its processing mode
    pub fn record_batch(&self, size: u64, mode: &str) {
        let attributes = &[KeyValue::new("mode", mode.to_string())];
        self.batch_size.record(size, attributes);
    }

    pub fn record_notification(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.notifications_total.add(1, attributes);
    }

    /// Record an error outcome by its JSON-RPC code
    pub fn record_error(&self, code: i32) {
        let attributes = &[KeyValue::new("code", i64::from(code))];
        self.errors_total.add(1, attributes);
    }
}
