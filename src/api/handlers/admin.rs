use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AdminUser;
use crate::api::dtos::requests::{
    BookingListQuery, CreateSlotRequest, DateRangeQuery, RecurringSlotsRequest, UpdateSlotRequest,
};
use crate::api::dtos::responses::{SlotDeletedResponse, SlotWriteResponse};
use crate::domain::models::booking::BookingFilter;
use crate::domain::models::slot::{ServiceType, Slot};
use crate::domain::services::local_time::{format_time, local_now, parse_date, parse_time};
use crate::error::AppError;
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

const ADMIN_MAX_RANGE_DAYS: i64 = 366;
const STATS_DEFAULT_SPAN_DAYS: i64 = 30;

fn check_capacity(service_type: ServiceType, capacity: i32) -> Result<(), AppError> {
    if capacity < 0 {
        return Err(AppError::Validation("Capacity cannot be negative".into()));
    }
    if service_type == ServiceType::Individual && capacity > 1 {
        return Err(AppError::Validation("Individual sessions have a single seat".into()));
    }
    Ok(())
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let today = local_now(state.clock.as_ref(), state.config.timezone).date();
    let (from, to) = query.resolve(today, today + Duration::days(STATS_DEFAULT_SPAN_DAYS), ADMIN_MAX_RANGE_DAYS)?;
    let slots = state.slot_repo.list_by_range(from, to).await?;
    Ok(Json(slots))
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateSlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let capacity = payload.capacity.unwrap_or(match payload.service_type {
        ServiceType::Individual => 1,
        ServiceType::Group => state.config.default_group_capacity,
    });
    check_capacity(payload.service_type, capacity)?;
    if capacity < 1 {
        return Err(AppError::Validation("A new slot needs at least one seat".into()));
    }

    let slot = Slot::new(parse_date(&payload.date)?, parse_time(&payload.time)?, payload.service_type, capacity);
    let created = match state.slot_repo.create(&slot).await {
        Ok(created) => created,
        Err(e) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!(
                "A {} slot already exists on {} at {}",
                slot.service_type.label(), slot.date, format_time(slot.time)
            )));
        }
        Err(e) => return Err(e),
    };
    state.slot_cache.invalidate_all();

    info!("Slot {} created by admin {}", created.id, admin.user_id);
    Ok((StatusCode::CREATED, Json(SlotWriteResponse { slot: created, warnings: vec![] })))
}

pub async fn generate_recurring_slots(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<RecurringSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload.into_domain(state.config.default_group_capacity)?;
    let summary = state.slot_generator.generate_recurring_slots(&request).await?;
    state.slot_cache.invalidate_all();

    info!("Recurring generation by admin {}: {:?}", admin.user_id, summary);
    Ok(Json(summary))
}

pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(slot_id): Path<String>,
    Json(payload): Json<UpdateSlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state.slot_repo.find_by_id(&slot_id).await?
        .ok_or(AppError::NotFound("Slot not found".into()))?;
    check_capacity(existing.service_type, payload.capacity)?;

    let slot = state.slot_repo.update_capacity(&slot_id, payload.capacity).await?;
    state.slot_cache.invalidate_all();

    // booked_count may have drifted; judge against the live bookings.
    let confirmed = state.booking_repo.list_confirmed_by_key(slot.date, slot.time).await?
        .iter()
        .filter(|b| b.slot_id == slot.id)
        .count();
    let mut warnings = Vec::new();
    if confirmed > slot.capacity.max(0) as usize {
        warn!("Slot {} capacity set to {} below its {} confirmed bookings", slot.id, slot.capacity, confirmed);
        warnings.push(format!(
            "Capacity {} is below the {} seats already booked; existing bookings are kept",
            slot.capacity, confirmed
        ));
    }

    info!("Slot {} capacity updated to {} by admin {}", slot.id, slot.capacity, admin.user_id);
    Ok(Json(SlotWriteResponse { slot, warnings }))
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted_bookings = state.slot_repo.delete(&slot_id).await?;
    state.slot_cache.invalidate_all();

    info!("Slot {} deleted by admin {} ({} bookings removed)", slot_id, admin.user_id, deleted_bookings);
    Ok(Json(SlotDeletedResponse { deleted_bookings }))
}

pub async fn reconcile_slots(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let report = state.booking_service.reconcile_slot_counters().await?;
    Ok(Json(report))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = BookingFilter {
        from: query.from.as_deref().map(parse_date).transpose()?,
        to: query.to.as_deref().map(parse_date).transpose()?,
        status: query.status,
    };
    let bookings = state.booking_repo.list(&filter).await?;
    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.booking_service.cancel_booking(&booking_id, &admin).await?;
    Ok(Json(outcome))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let today = local_now(state.clock.as_ref(), state.config.timezone).date();
    let (from, to) = query.resolve(
        today - Duration::days(STATS_DEFAULT_SPAN_DAYS),
        today + Duration::days(STATS_DEFAULT_SPAN_DAYS),
        ADMIN_MAX_RANGE_DAYS,
    )?;
    let stats = state.booking_repo.stats(from, to).await?;
    Ok(Json(stats))
}
