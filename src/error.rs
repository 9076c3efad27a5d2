use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::DatabaseError;
use crate::scheduling::clock::ClockError;
use crate::scheduling::BookingError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ClockError> for AppError {
    fn from(err: ClockError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Booking(err) => match err {
                BookingError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
                BookingError::SlotTaken { .. } | BookingError::CapacityExceeded { .. } => (
                    StatusCode::CONFLICT,
                    "The selected slot is no longer available, please choose another",
                ),
                BookingError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "Appointment status cannot change")
                }
                BookingError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
                BookingError::StoreUnavailable { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Scheduling is temporarily unavailable, please retry",
                ),
            },
            AppError::Database(err) => match err {
                DatabaseError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
                DatabaseError::Duplicate => (StatusCode::CONFLICT, "Resource already exists"),
                DatabaseError::Conflict => {
                    (StatusCode::CONFLICT, "Resource changed, reload and retry")
                }
                DatabaseError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input data"),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred",
                ),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": error_message,
                "details": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
