use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use horizons_core::{BookingError, StoreError};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        // Client faults carry `error`, failures on an existing resource or the server `message`.
        let key = match status {
            StatusCode::NOT_FOUND | StatusCode::CONFLICT | StatusCode::INTERNAL_SERVER_ERROR => {
                "message"
            }
            _ => "error",
        };

        let mut body = Map::new();
        body.insert(key.to_string(), Value::String(error_message));
        let body = Json(Value::Object(body));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            BookingError::NotFound(_) => Self::NotFound(err.to_string()),
            BookingError::CreateFailed(_) => Self::Internal(err.to_string()),
            BookingError::Store(_) => Self::Anyhow(anyhow::Error::new(err)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Anyhow(anyhow::anyhow!(err))
    }
}
