use axum::{
    http::Method,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod seats;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(bookings::routes(state.clone()))
        .merge(seats::routes())
        .merge(health::routes())
        .merge(metrics::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
