use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json,
    Router,
};
use horizons_store::{DbClient, EventProducer};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::state::AppState;

/// A dependency the service needs to be ready.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}

#[async_trait]
impl HealthProbe for DbClient {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.ping().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl HealthProbe for EventProducer {
    fn name(&self) -> &'static str {
        "broker"
    }

    async fn check(&self) -> Result<(), String> {
        match self.broker_count(Duration::from_secs(2)).await {
            Ok(0) => Err("no brokers reachable".to_string()),
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mut checks = Map::new();
    let mut healthy = true;

    for probe in &state.probes {
        let status = match probe.check().await {
            Ok(()) => "UP".to_string(),
            Err(e) => {
                tracing::warn!(probe = probe.name(), error = %e, "Health check failed");
                healthy = false;
                format!("DOWN: {}", e)
            }
        };
        checks.insert(probe.name().to_string(), Value::String(status));
    }

    let code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = json!({
        "status": if healthy { "UP" } else { "DOWN" },
        "checks": checks,
    });

    (code, Json(body))
}
