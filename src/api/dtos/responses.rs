use chrono::NaiveDate;
use serde::Serialize;
use crate::domain::models::slot::Slot;
use crate::domain::services::availability::AvailabilityView;

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub slots: Vec<AvailabilityView>,
}

#[derive(Serialize)]
pub struct SlotWriteResponse {
    pub slot: Slot,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct SlotDeletedResponse {
    pub deleted_bookings: u64,
}
