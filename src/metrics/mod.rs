mod server;

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for dispatch observability
// ============================================================================
//
// Tracks:
// - Events published per event type (whether or not anyone was listening)
// - Successful handler invocations per event type
// - Handler failures per event type
// - Handlers currently registered
//
// Scraped through the HTTP endpoint in `server`.
// ============================================================================

/// Central metrics registry for event dispatch
pub struct DispatchMetrics {
    registry: Registry,

    pub events_published: IntCounterVec,
    pub handler_invocations: IntCounterVec,
    pub handler_failures: IntCounterVec,
    pub handlers_registered: IntGauge,
}

impl DispatchMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let events_published = IntCounterVec::new(
            Opts::new("events_published_total", "Total events published"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let handler_invocations = IntCounterVec::new(
            Opts::new(
                "handler_invocations_total",
                "Total handler invocations that completed cleanly",
            ),
            &["event_type"],
        )?;
        registry.register(Box::new(handler_invocations.clone()))?;

        let handler_failures = IntCounterVec::new(
            Opts::new(
                "handler_failures_total",
                "Total handler invocations that returned an error",
            ),
            &["event_type"],
        )?;
        registry.register(Box::new(handler_failures.clone()))?;

        let handlers_registered = IntGauge::new(
            "handlers_registered",
            "Handlers currently registered across all event types",
        )?;
        registry.register(Box::new(handlers_registered.clone()))?;

        Ok(Self {
            registry,
            events_published,
            handler_invocations,
            handler_failures,
            handlers_registered,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_published(&self, event_type: &str) {
        self.events_published.with_label_values(&[event_type]).inc();
    }

    pub fn record_invocation(&self, event_type: &str) {
        self.handler_invocations
            .with_label_values(&[event_type])
            .inc();
    }

    pub fn record_failure(&self, event_type: &str) {
        self.handler_failures.with_label_values(&[event_type]).inc();
    }
}
