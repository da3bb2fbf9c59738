use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};
use crate::domain::models::booking::{Booking, BookingOutcome, BookingStatus};
use crate::domain::models::slot::{ServiceType, SlotKey};
use crate::domain::models::subject::{Actor, BookingContext};
use crate::domain::ports::{BookingRepository, Clock, DependentRepository, SlotRepository};
use crate::domain::services::availability::{resolve_availability, AvailabilityView};
use crate::domain::services::local_time::local_now;
use crate::error::{AppError, BookingConflict};

const MAX_NOTES_LEN: usize = 500;
pub const COUNTER_WARNING: &str = "Seat counter could not be updated; it will be repaired by the next reconciliation";

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub service_type: ServiceType,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub updated: u64,
}

pub struct BookingService {
    slot_repo: Arc<dyn SlotRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    dependent_repo: Arc<dyn DependentRepository>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl BookingService {
    pub fn new(
        slot_repo: Arc<dyn SlotRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        dependent_repo: Arc<dyn DependentRepository>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self { slot_repo, booking_repo, dependent_repo, clock, timezone }
    }

    pub async fn availability(&self, key: SlotKey, subject_id: Option<&str>) -> Result<AvailabilityView, AppError> {
        let slots = self.slot_repo.list_by_key(key.date, key.time).await?;
        let bookings = self.booking_repo.list_confirmed_by_key(key.date, key.time).await?;
        Ok(resolve_availability(key, &slots, &bookings, subject_id))
    }

    pub async fn create_booking(&self, ctx: &BookingContext, request: BookingRequest) -> Result<BookingOutcome, AppError> {
        let notes = request.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(AppError::Validation(format!("Notes are limited to {} characters", MAX_NOTES_LEN)));
        }

        if let Some(dependent_id) = ctx.subject.dependent_id() {
            let dependent = self.dependent_repo.find_by_id(dependent_id).await?
                .ok_or(AppError::NotFound("Dependent not found".into()))?;
            if dependent.user_id != ctx.subject.user_id() {
                return Err(AppError::Forbidden("This profile is not linked to your account".into()));
            }
        }

        let key = SlotKey::new(request.date, request.time);
        let service_type = request.service_type;
        let subject_id = ctx.subject.subject_id();

        let slots = self.slot_repo.list_by_key(key.date, key.time).await?;
        let slot = slots.iter()
            .find(|s| s.service_type == service_type && s.is_offered())
            .ok_or(BookingConflict::SlotNotOffered(service_type))?;

        let bookings = self.booking_repo.list_confirmed_by_key(key.date, key.time).await?;
        if bookings.iter().any(|b| b.service_type == service_type && b.subject_id == subject_id) {
            return Err(BookingConflict::DuplicateBooking.into());
        }

        let view = resolve_availability(key, &slots, &bookings, Some(subject_id));
        if let Some(conflict) = view.refusal(service_type) {
            info!("Booking refused for {} {} {:?}: {}", key.date, key.time, service_type, conflict);
            return Err(conflict.into());
        }

        if slot.starts_at() < local_now(self.clock.as_ref(), self.timezone) {
            return Err(AppError::Validation("Cannot book a session in the past".into()));
        }

        let booking = Booking::new(slot, &ctx.subject, notes);
        let created = match self.booking_repo.create_if_available(&booking).await {
            Ok(Some(created)) => created,
            Ok(None) => {
                warn!("Guarded insert rejected booking on slot {}; state changed since the check", slot.id);
                let fresh = self.availability(key, Some(subject_id)).await?;
                return Err(fresh.refusal(service_type).unwrap_or(BookingConflict::SlotFull).into());
            }
            Err(e) if e.is_unique_violation() => return Err(BookingConflict::DuplicateBooking.into()),
            Err(e) => return Err(e),
        };

        let mut warnings = Vec::new();
        if let Err(e) = self.slot_repo.increment_booked(&slot.id).await {
            warn!("Booking {} stored but slot counter increment failed: {}", created.id, e);
            warnings.push(COUNTER_WARNING.to_string());
        }

        info!("Booking confirmed: {} on slot {} for subject {}", created.id, slot.id, subject_id);
        Ok(BookingOutcome { booking: created, warnings })
    }

    pub async fn cancel_booking(&self, booking_id: &str, actor: &Actor) -> Result<BookingOutcome, AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if !actor.is_admin && booking.user_id != actor.user_id {
            return Err(AppError::Forbidden("You can only cancel your own bookings".into()));
        }

        match booking.status {
            BookingStatus::Cancelled => return Err(BookingConflict::AlreadyCancelled.into()),
            BookingStatus::Completed => return Err(AppError::Validation("A completed session cannot be cancelled".into())),
            BookingStatus::Confirmed => {}
        }

        let cancelled = self.booking_repo.cancel(&booking.id).await?
            .ok_or(BookingConflict::AlreadyCancelled)?;

        let mut warnings = Vec::new();
        if let Err(e) = self.slot_repo.decrement_booked(&cancelled.slot_id).await {
            warn!("Booking {} cancelled but slot counter decrement failed: {}", cancelled.id, e);
            warnings.push(COUNTER_WARNING.to_string());
        }

        info!("Booking cancelled: {} by {} (admin: {})", cancelled.id, actor.user_id, actor.is_admin);
        Ok(BookingOutcome { booking: cancelled, warnings })
    }

    /// Unlinks a dependent and releases the seats its confirmed bookings held.
    pub async fn remove_dependent(&self, user_id: &str, dependent_id: &str) -> Result<u64, AppError> {
        // Deleting first closes the door on new bookings for this profile.
        self.dependent_repo.delete(user_id, dependent_id).await?;

        let released = self.booking_repo.cancel_confirmed_for_subject(dependent_id).await?;
        for booking in &released {
            if let Err(e) = self.slot_repo.decrement_booked(&booking.slot_id).await {
                warn!("Booking {} released but slot counter decrement failed: {}", booking.id, e);
            }
        }

        info!("Dependent {} removed by user {} ({} bookings released)", dependent_id, user_id, released.len());
        Ok(released.len() as u64)
    }

    pub async fn reconcile_slot_counters(&self) -> Result<ReconcileReport, AppError> {
        let updated = self.slot_repo.reconcile_counters().await?;
        if updated > 0 {
            warn!("Reconciliation repaired {} drifted slot counters", updated);
        } else {
            info!("Reconciliation found no drifted slot counters");
        }
        Ok(ReconcileReport { updated })
    }

    /// Confirmed bookings whose session has started become completed.
    pub async fn complete_past_bookings(&self) -> Result<u64, AppError> {
        let now = local_now(self.clock.as_ref(), self.timezone);
        self.booking_repo.complete_started_before(now.date(), now.time()).await
    }
}
