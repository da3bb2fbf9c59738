use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::CreateBookingRequest;
use crate::domain::models::subject::{BookingContext, SubjectRef};
use crate::domain::services::booking_service::BookingRequest;
use crate::domain::services::local_time::{parse_date, parse_time};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = BookingRequest {
        date: parse_date(&payload.date)?,
        time: parse_time(&payload.time)?,
        service_type: payload.service_type,
        notes: payload.notes,
    };

    let subject = match payload.dependent_id {
        Some(dependent_id) => SubjectRef::dependent(actor.user_id.clone(), dependent_id),
        None => SubjectRef::account(actor.user_id.clone()),
    };
    info!("create_booking: {} {} {:?} for {:?}", request.date, request.time, request.service_type, subject);

    let outcome = state.booking_service
        .create_booking(&BookingContext { actor, subject }, request)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// The caller's bookings, including those made for linked profiles.
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_user(&actor.user_id).await?;
    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.booking_service.cancel_booking(&booking_id, &actor).await?;
    Ok(Json(outcome))
}
