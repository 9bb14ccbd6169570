//! Prometheus counters for `/metrics`.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    outcomes: IntCounterVec,
    delivery_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let outcomes = IntCounterVec::new(
            Opts::new("formgate_outcomes_total", "Requests by form and terminal state"),
            &["form", "state"],
        )?;
        let delivery_failures = IntCounterVec::new(
            Opts::new("formgate_delivery_failures_total", "Failed channel deliveries"),
            &["form", "channel"],
        )?;

        registry.register(Box::new(outcomes.clone()))?;
        registry.register(Box::new(delivery_failures.clone()))?;

        Ok(Self {
            registry,
            outcomes,
            delivery_failures,
        })
    }

    pub fn record_outcome(&self, form: &str, state: &str) {
        self.outcomes.with_label_values(&[form, state]).inc();
    }

    pub fn record_delivery_failure(&self, form: &str, channel: &str) {
        self.delivery_failures.with_label_values(&[form, channel]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
