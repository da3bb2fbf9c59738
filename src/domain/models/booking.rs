use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::domain::models::slot::{ServiceType, Slot, SlotKey, UnknownVariant};
use crate::domain::models::subject::SubjectRef;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub slot_id: String,
    #[sqlx(rename = "slot_date")]
    pub date: NaiveDate,
    #[sqlx(rename = "slot_time")]
    pub time: NaiveTime,
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub user_id: String,
    pub subject_id: String,
    pub dependent_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(slot: &Slot, subject: &SubjectRef, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slot_id: slot.id.clone(),
            date: slot.date,
            time: slot.time,
            service_type: slot.service_type,
            user_id: subject.user_id().to_string(),
            subject_id: subject.subject_id().to_string(),
            dependent_id: subject.dependent_id().map(str::to_string),
            status: BookingStatus::Confirmed,
            notes,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey { date: self.date, time: self.time }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Result of a booking write. Counter maintenance failures do not undo the
/// booking and are surfaced here instead.
#[derive(Debug, Serialize, Clone)]
pub struct BookingOutcome {
    pub booking: Booking,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BookingStats {
    pub slots: i64,
    pub seats: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub completed: i64,
    pub individual_confirmed: i64,
    pub group_confirmed: i64,
    pub fill_rate: f64,
}

impl BookingStats {
    /// Fill rate counts seats taken by confirmed and completed bookings.
    pub fn from_counts(
        slots: i64,
        seats: i64,
        confirmed: i64,
        cancelled: i64,
        completed: i64,
        individual_confirmed: i64,
        group_confirmed: i64,
    ) -> Self {
        let fill_rate = if seats > 0 { (confirmed + completed) as f64 / seats as f64 } else { 0.0 };
        Self { slots, seats, confirmed, cancelled, completed, individual_confirmed, group_confirmed, fill_rate }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}
