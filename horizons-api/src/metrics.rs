use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{opts, IntCounter, IntCounterVec, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Prometheus registry of the booking service.
pub struct Metrics {
    registry: Registry,

    /// Labels: `topic`, `outcome` (applied, skipped, error)
    pub events_consumed: IntCounterVec,

    pub bookings_created: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_consumed = IntCounterVec::new(
            opts!(
                "booking_events_consumed_total",
                "Messages handled by the booking event consumers"
            ),
            &["topic", "outcome"],
        )?;

        let bookings_created = IntCounter::with_opts(opts!(
            "http_bookings_created_total",
            "Bookings created through the HTTP API"
        ))?;

        registry.register(Box::new(events_consumed.clone()))?;
        registry.register(Box::new(bookings_created.clone()))?;

        Ok(Self {
            registry,
            events_consumed,
            bookings_created,
        })
    }

    pub fn record_event(&self, topic: &str, outcome: &str) {
        self.events_consumed.with_label_values(&[topic, outcome]).inc();
    }

    pub fn export_prometheus(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .export_prometheus()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
