use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Order workflow counters, each on its own registry so test apps do not collide.
pub struct Metrics {
    registry: Registry,
    pub orders_placed: IntCounter,
    pub payment_prepare_failures: IntCounter,
    pub order_status_updates: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_placed = IntCounter::new(
            "orders_placed_total",
            "Orders created with a prepared payment",
        )?;
        let payment_prepare_failures = IntCounter::new(
            "payment_prepare_failures_total",
            "Payment preparations rejected by or unreachable at the gateway",
        )?;
        let order_status_updates = IntCounterVec::new(
            Opts::new("order_status_updates_total", "Order status changes by new status"),
            &["status"],
        )?;

        registry.register(Box::new(orders_placed.clone()))?;
        registry.register(Box::new(payment_prepare_failures.clone()))?;
        registry.register(Box::new(order_status_updates.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            payment_prepare_failures,
            order_status_updates,
        })
    }

    pub fn record_status_update(&self, status: &str) {
        self.order_status_updates.with_label_values(&[status]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.encode().map_err(anyhow::Error::from)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
