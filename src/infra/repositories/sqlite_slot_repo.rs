use crate::domain::{models::slot::Slot, ports::SlotRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use chrono::{NaiveDate, NaiveTime};

const INSERT_SLOTS: &str = "INSERT INTO slots (id, slot_date, slot_time, service_type, capacity, booked_count, created_at) ";

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn batch_insert<'a>(slots: &'a [Slot]) -> QueryBuilder<'a, Sqlite> {
        let mut builder = QueryBuilder::new(INSERT_SLOTS);
        builder.push_values(slots, |mut row, slot| {
            row.push_bind(slot.id.clone())
                .push_bind(slot.date)
                .push_bind(slot.time)
                .push_bind(slot.service_type.as_str())
                .push_bind(slot.capacity)
                .push_bind(slot.booked_count)
                .push_bind(slot.created_at);
        });
        builder
    }
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn create(&self, slot: &Slot) -> Result<Slot, AppError> {
        sqlx::query_as::<_, Slot>(
            "INSERT INTO slots (id, slot_date, slot_time, service_type, capacity, booked_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&slot.id).bind(slot.date).bind(slot.time).bind(slot.service_type.as_str())
            .bind(slot.capacity).bind(slot.booked_count).bind(slot.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_key(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE slot_date = ? AND slot_time = ? ORDER BY service_type ASC").bind(date).bind(time).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE slot_date >= ? AND slot_date <= ? ORDER BY slot_date ASC, slot_time ASC, service_type ASC").bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_capacity(&self, id: &str, capacity: i32) -> Result<Slot, AppError> {
        sqlx::query_as::<_, Slot>("UPDATE slots SET capacity = ? WHERE id = ? RETURNING *")
            .bind(capacity).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Slot not found".into()))
    }
    async fn delete(&self, id: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let removed = sqlx::query("DELETE FROM bookings WHERE slot_id = ?").bind(id).execute(&mut *tx).await.map_err(AppError::Database)?;
        let result = sqlx::query("DELETE FROM slots WHERE id = ?").bind(id).execute(&mut *tx).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Slot not found".into())); }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(removed.rows_affected())
    }
    async fn insert_batch(&self, slots: &[Slot]) -> Result<u64, AppError> {
        if slots.is_empty() { return Ok(0); }
        let result = Self::batch_insert(slots).build().execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
    async fn insert_batch_skip_existing(&self, slots: &[Slot]) -> Result<u64, AppError> {
        if slots.is_empty() { return Ok(0); }
        let mut builder = Self::batch_insert(slots);
        builder.push(" ON CONFLICT (slot_date, slot_time, service_type) DO NOTHING");
        let result = builder.build().execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
    async fn increment_booked(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE slots SET booked_count = booked_count + 1 WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Slot not found".into())); }
        Ok(())
    }
    async fn decrement_booked(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE slots SET booked_count = MAX(booked_count - 1, 0) WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Slot not found".into())); }
        Ok(())
    }
    async fn reconcile_counters(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots SET booked_count = (
                 SELECT COUNT(*) FROM bookings b WHERE b.slot_id = slots.id AND b.status = 'CONFIRMED'
             )
             WHERE booked_count <> (
                 SELECT COUNT(*) FROM bookings b WHERE b.slot_id = slots.id AND b.status = 'CONFIRMED'
             )"
        )
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
