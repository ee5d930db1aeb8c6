use axum::{
    extract::{Json, Path, State},
    routing::get,
    Router,
};
use horizons_core::Seat;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/bookings/seats/{flight_code}", get(seats_for_flight))
}

/// Seat map of the aircraft with seats held by bookings on this flight marked unavailable.
async fn seats_for_flight(
    State(state): State<AppState>,
    Path(flight_code): Path<String>,
) -> Result<Json<Vec<Seat>>, AppError> {
    let seats = state.seats.get_by_flight_code(&flight_code).await?;
    Ok(Json(seats))
}
