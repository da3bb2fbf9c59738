use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

/// The two kinds of coaching sessions. At a given date/time they exclude each other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Individual,
    Group,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Individual => "INDIVIDUAL",
            ServiceType::Group => "GROUP",
        }
    }

    pub fn other(&self) -> ServiceType {
        match self {
            ServiceType::Individual => ServiceType::Group,
            ServiceType::Group => ServiceType::Individual,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Individual => "individual coaching",
            ServiceType::Group => "group coaching",
        }
    }
}

impl TryFrom<String> for ServiceType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "INDIVIDUAL" => Ok(ServiceType::Individual),
            "GROUP" => Ok(ServiceType::Group),
            _ => Err(UnknownVariant(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Slot {
    pub id: String,
    #[sqlx(rename = "slot_date")]
    pub date: NaiveDate,
    #[sqlx(rename = "slot_time")]
    pub time: NaiveTime,
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub capacity: i32,
    pub booked_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime, service_type: ServiceType, capacity: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            time,
            service_type,
            capacity,
            booked_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> SlotKey {
        SlotKey { date: self.date, time: self.time }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Zero-capacity rows are kept in the ledger but never offered.
    pub fn is_offered(&self) -> bool {
        self.capacity > 0
    }
}

/// A (date, time) pair shared by the individual and group slot rows.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }
}
