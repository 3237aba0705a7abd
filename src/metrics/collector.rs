// src/metrics/collector.rs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;

/// Owns the Prometheus registry and the collector handed out to handlers.
///
/// Every instance has its own `Registry`, so tests can build isolated
/// registries without touching the process-wide default one.
pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Encode every registered metric in the text exposition format.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

pub struct MetricsCollector {
    // Inbound requests
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,

    // Backend calls
    pub backend_requests_total: IntCounterVec,
    pub backend_request_duration_seconds: HistogramVec,

    pub active_connections: IntGauge,
    pub errors_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status_code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let backend_requests_total = IntCounterVec::new(
            Opts::new("backend_requests_total", "Total backend requests"),
            &["status_code", "backend_url"],
        )?;
        registry.register(Box::new(backend_requests_total.clone()))?;

        let backend_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "backend_request_duration_seconds",
                "Backend request duration in seconds",
            ),
            &["backend_url"],
        )?;
        registry.register(Box::new(backend_request_duration_seconds.clone()))?;

        let active_connections =
            IntGauge::new("active_connections", "Number of active connections")?;
        registry.register(Box::new(active_connections.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("errors_total", "Total errors"),
            &["error_type", "endpoint"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            backend_requests_total,
            backend_request_duration_seconds,
            active_connections,
            errors_total,
        })
    }

    pub fn record_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration: Duration,
    ) {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, &status])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    /// `status` is the backend's numeric status or an error kind such as `timeout`.
    pub fn record_backend_request(&self, status: &str, backend_url: &str) {
        self.backend_requests_total
            .with_label_values(&[status, backend_url])
            .inc();
    }

    pub fn observe_backend_duration(&self, backend_url: &str, duration: Duration) {
        self.backend_request_duration_seconds
            .with_label_values(&[backend_url])
            .observe(duration.as_secs_f64());
    }

    pub fn record_error(&self, error_type: &str, endpoint: &str) {
        self.errors_total
            .with_label_values(&[error_type, endpoint])
            .inc();
    }

    pub fn increment_active_connections(&self) {
        self.active_connections.inc();
    }

    pub fn decrement_active_connections(&self) {
        self.active_connections.dec();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
