use crate::domain::{models::booking::{Booking, BookingFilter, BookingStats}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use chrono::{NaiveDate, NaiveTime};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_if_available(&self, booking: &Booking) -> Result<Option<Booking>, AppError> {
        // SQLite serializes writers, so the guard and the insert see the same state.
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, slot_id, slot_date, slot_time, service_type, user_id, subject_id, dependent_id, status, notes, created_at)
             SELECT ?, s.id, s.slot_date, s.slot_time, s.service_type, ?, ?, ?, 'CONFIRMED', ?, ?
             FROM slots s
             WHERE s.id = ?
               AND s.capacity > (SELECT COUNT(*) FROM bookings b WHERE b.slot_id = s.id AND b.status = 'CONFIRMED')
               AND (s.service_type <> 'INDIVIDUAL'
                    OR NOT EXISTS (SELECT 1 FROM bookings b WHERE b.slot_id = s.id AND b.status = 'CONFIRMED'))
               AND NOT EXISTS (
                    SELECT 1 FROM bookings b JOIN slots o ON o.id = b.slot_id
                    WHERE o.slot_date = s.slot_date AND o.slot_time = s.slot_time
                      AND o.id <> s.id AND b.status = 'CONFIRMED')
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.user_id).bind(&booking.subject_id).bind(&booking.dependent_id)
            .bind(&booking.notes).bind(booking.created_at).bind(&booking.slot_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_confirmed_by_key(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_date = ? AND slot_time = ? AND status = 'CONFIRMED' ORDER BY created_at ASC").bind(date).bind(time).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_confirmed_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_date >= ? AND slot_date <= ? AND status = 'CONFIRMED'").bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = ? ORDER BY slot_date DESC, slot_time DESC").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM bookings WHERE 1 = 1");
        if let Some(from) = filter.from {
            builder.push(" AND slot_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND slot_date <= ").push_bind(to);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY slot_date ASC, slot_time ASC, created_at ASC");
        builder.build_query_as::<Booking>().fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn cancel(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = 'CANCELLED' WHERE id = ? AND status = 'CONFIRMED' RETURNING *").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn cancel_confirmed_for_subject(&self, subject_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = 'CANCELLED' WHERE subject_id = ? AND status = 'CONFIRMED' RETURNING *").bind(subject_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn complete_started_before(&self, date: NaiveDate, time: NaiveTime) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'COMPLETED'
             WHERE status = 'CONFIRMED' AND (slot_date < ? OR (slot_date = ? AND slot_time <= ?))"
        )
            .bind(date).bind(date).bind(time)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
    async fn stats(&self, from: NaiveDate, to: NaiveDate) -> Result<BookingStats, AppError> {
        let slots = sqlx::query(
            "SELECT COUNT(*) AS slots, COALESCE(SUM(capacity), 0) AS seats
             FROM slots WHERE slot_date >= ? AND slot_date <= ? AND capacity > 0"
        )
            .bind(from).bind(to)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        let bookings = sqlx::query(
            "SELECT
                 COALESCE(SUM(CASE WHEN status = 'CONFIRMED' THEN 1 ELSE 0 END), 0) AS confirmed,
                 COALESCE(SUM(CASE WHEN status = 'CANCELLED' THEN 1 ELSE 0 END), 0) AS cancelled,
                 COALESCE(SUM(CASE WHEN status = 'COMPLETED' THEN 1 ELSE 0 END), 0) AS completed,
                 COALESCE(SUM(CASE WHEN status = 'CONFIRMED' AND service_type = 'INDIVIDUAL' THEN 1 ELSE 0 END), 0) AS individual_confirmed,
                 COALESCE(SUM(CASE WHEN status = 'CONFIRMED' AND service_type = 'GROUP' THEN 1 ELSE 0 END), 0) AS group_confirmed
             FROM bookings WHERE slot_date >= ? AND slot_date <= ?"
        )
            .bind(from).bind(to)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        Ok(BookingStats::from_counts(
            slots.try_get("slots")?,
            slots.try_get("seats")?,
            bookings.try_get("confirmed")?,
            bookings.try_get("cancelled")?,
            bookings.try_get("completed")?,
            bookings.try_get("individual_confirmed")?,
            bookings.try_get("group_confirmed")?,
        ))
    }
}
