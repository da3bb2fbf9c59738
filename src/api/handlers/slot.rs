use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::maybe_auth::MaybeAuthUser;
use crate::api::dtos::requests::DateRangeQuery;
use crate::api::dtos::responses::AvailabilityResponse;
use crate::domain::models::slot::SlotKey;
use crate::domain::services::availability::group_by_key;
use crate::domain::services::local_time::{local_now, parse_date, parse_time};
use crate::error::AppError;
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_WINDOW_DAYS: i64 = 6;
pub const MAX_WINDOW_DAYS: i64 = 92;

/// Calendar view: one availability entry per date/time that has slots.
pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let today = local_now(state.clock.as_ref(), state.config.timezone).date();
    let (from, to) = query.resolve(today, today + Duration::days(DEFAULT_WINDOW_DAYS), MAX_WINDOW_DAYS)?;

    let repo = state.slot_repo.clone();
    let slots = state.slot_cache
        .get_or_load(from, to, || async move { repo.list_by_range(from, to).await })
        .await?;
    let bookings = state.booking_repo.list_confirmed_by_range(from, to).await?;

    let views = group_by_key(&slots, &bookings, user_id.as_deref());
    debug!("Availability {}..{}: {} keys", from, to, views.len());

    Ok(Json(AvailabilityResponse { from, to, slots: views }))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    Path((date, time)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let key = SlotKey::new(parse_date(&date)?, parse_time(&time)?);
    let view = state.booking_service.availability(key, user_id.as_deref()).await?;
    Ok(Json(view))
}
