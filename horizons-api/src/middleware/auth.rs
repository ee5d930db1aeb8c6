use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Claims forwarded by the API gateway after it authenticated the caller.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

pub async fn gateway_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let token_data = decode::<GatewayClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if !state.auth.allows(&token_data.claims.role) {
        return Err(AppError::Forbidden(format!(
            "Role {} may not access bookings",
            token_data.claims.role
        )));
    }

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
