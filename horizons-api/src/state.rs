use std::sync::Arc;
use horizons_booking::BookingService;
use horizons_core::repository::SeatRepository;

use crate::health::HealthProbe;
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub allowed_roles: Vec<String>,
}

impl AuthConfig {
    pub fn allows(&self, role: &str) -> bool {
        self.allowed_roles.iter().any(|r| r == role)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub seats: Arc<dyn SeatRepository>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
    pub probes: Vec<Arc<dyn HealthProbe>>,
}
