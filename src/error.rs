use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::domain::models::slot::ServiceType;

/// Expected, user-facing refusals of a booking request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingConflict {
    #[error("No {} session is offered at this date and time", .0.label())]
    SlotNotOffered(ServiceType),
    #[error("You already booked this session")]
    DuplicateBooking,
    #[error("This session is full")]
    SlotFull,
    #[error("Unavailable: {} is already booked at this time", .0.label())]
    ExclusiveTypeBooked(ServiceType),
    #[error("This booking is already cancelled")]
    AlreadyCancelled,
}

impl BookingConflict {
    pub fn code(&self) -> &'static str {
        match self {
            BookingConflict::SlotNotOffered(_) => "slot_not_offered",
            BookingConflict::DuplicateBooking => "duplicate_booking",
            BookingConflict::SlotFull => "slot_full",
            BookingConflict::ExclusiveTypeBooked(_) => "exclusive_type_booked",
            BookingConflict::AlreadyCancelled => "already_cancelled",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Booking(#[from] BookingConflict),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation()),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if self.is_unique_violation() {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Booking(conflict) => {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": conflict.to_string(), "code": conflict.code() }))
                ).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
