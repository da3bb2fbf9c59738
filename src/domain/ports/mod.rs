use crate::domain::models::{
    user::User, dependent::Dependent, slot::Slot,
    booking::{Booking, BookingFilter, BookingStats},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait DependentRepository: Send + Sync {
    async fn create(&self, dependent: &Dependent) -> Result<Dependent, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Dependent>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Dependent>, AppError>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn create(&self, slot: &Slot) -> Result<Slot, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError>;
    /// Both service-type rows sharing a date/time.
    async fn list_by_key(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<Slot>, AppError>;
    /// Inclusive on both ends.
    async fn list_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, AppError>;
    async fn update_capacity(&self, id: &str, capacity: i32) -> Result<Slot, AppError>;
    /// Removes the slot together with its bookings. Returns the number of bookings removed.
    async fn delete(&self, id: &str) -> Result<u64, AppError>;
    /// All-or-nothing insert; fails on the first uniqueness violation.
    async fn insert_batch(&self, slots: &[Slot]) -> Result<u64, AppError>;
    /// Inserts the rows whose key is free and returns how many were written.
    async fn insert_batch_skip_existing(&self, slots: &[Slot]) -> Result<u64, AppError>;
    async fn increment_booked(&self, id: &str) -> Result<(), AppError>;
    /// Never goes below zero.
    async fn decrement_booked(&self, id: &str) -> Result<(), AppError>;
    /// Rewrites `booked_count` from confirmed bookings where it drifted. Returns rows touched.
    async fn reconcile_counters(&self) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking only if, at write time, the slot still has a free seat and
    /// the other service type at the same date/time holds no confirmed booking.
    /// Returns `None` when that guard rejects the row.
    async fn create_if_available(&self, booking: &Booking) -> Result<Option<Booking>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_confirmed_by_key(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<Booking>, AppError>;
    async fn list_confirmed_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    /// Flips a confirmed booking to cancelled. `None` if it was not confirmed anymore.
    async fn cancel(&self, id: &str) -> Result<Option<Booking>, AppError>;
    /// Cancels every confirmed booking held by a subject and returns them.
    async fn cancel_confirmed_for_subject(&self, subject_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Marks confirmed bookings starting at or before the given local date/time as completed.
    async fn complete_started_before(&self, date: NaiveDate, time: NaiveTime) -> Result<u64, AppError>;
    async fn stats(&self, from: NaiveDate, to: NaiveDate) -> Result<BookingStats, AppError>;
}
