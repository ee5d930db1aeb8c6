use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Extension, Json, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Router,
};
use horizons_core::{Booking, BookingId};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::middleware::{gateway_auth_middleware, GatewayClaims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/bookings/", get(list_own_bookings).put(update_booking))
        .route_layer(middleware::from_fn_with_state(state, gateway_auth_middleware));

    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", delete(delete_booking))
        .merge(protected)
}

fn parse_body(payload: Result<Json<Booking>, JsonRejection>) -> Result<Booking, AppError> {
    payload
        .map(|Json(booking)| booking)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<Booking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = parse_body(payload)?;
    let created = state.bookings.create(booking).await?;

    state.metrics.bookings_created.inc();

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_own_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<GatewayClaims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.get_by_user_id(claims.user_id).await?;

    if bookings.iter().any(|b| !b.is_owned_by(claims.user_id)) {
        return Err(AppError::Forbidden(
            "unauthorized: cannot access the bookings belonging to another user".to_string(),
        ));
    }

    Ok(Json(bookings))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<GatewayClaims>,
    payload: Result<Json<Booking>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let booking = parse_body(payload)?;

    if !booking.is_owned_by(claims.user_id) {
        return Err(AppError::Forbidden(
            "unauthorized: cannot access the bookings belonging to another user".to_string(),
        ));
    }

    let updated = state.bookings.update(booking).await?;
    Ok(Json(updated))
}

async fn delete_booking(
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("Invalid bookingID".to_string()))?;

    if state.bookings.delete_by_booking_id(id).await? {
        Ok(Json(json!({ "message": "Booking deleted successfully" })))
    } else {
        Err(AppError::Internal(
            "Failed to delete Booking, but no error has occurred".to_string(),
        ))
    }
}
