use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use crate::domain::models::booking::BookingStatus;
use crate::domain::models::slot::ServiceType;
use crate::domain::services::local_time::{parse_date, parse_time};
use crate::domain::services::slot_generator::{RecurringRequest, TimeSpec, Weeks};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateDependentRequest {
    pub name: String,
}

/// `from`/`to` as `YYYY-MM-DD`, both inclusive.
#[derive(Deserialize, Default)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRangeQuery {
    pub fn resolve(&self, default_from: NaiveDate, default_to: NaiveDate, max_days: i64) -> Result<(NaiveDate, NaiveDate), AppError> {
        let from = self.from.as_deref().map(parse_date).transpose()?.unwrap_or(default_from);
        let to = self.to.as_deref().map(parse_date).transpose()?.unwrap_or(default_to.max(from));
        if to < from {
            return Err(AppError::Validation("'to' must not be before 'from'".into()));
        }
        if (to - from).num_days() > max_days {
            return Err(AppError::Validation(format!("Date range is limited to {} days", max_days)));
        }
        Ok((from, to))
    }
}

#[derive(Deserialize, Default)]
pub struct BookingListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<BookingStatus>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub date: String,
    pub time: String,
    pub service_type: ServiceType,
    /// Book for a linked profile instead of the account itself.
    pub dependent_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub date: String,
    pub time: String,
    pub service_type: ServiceType,
    pub capacity: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateSlotRequest {
    pub capacity: i32,
}

/// Either `time` (a single `HH:MM`) or the `start_hour`/`end_hour` pair.
/// `weeks` omitted means "until the horizon".
#[derive(Deserialize)]
pub struct RecurringSlotsRequest {
    pub start_date: String,
    pub weekdays: Vec<String>,
    pub time: Option<String>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub service_types: Vec<ServiceType>,
    pub weeks: Option<u32>,
    pub group_capacity: Option<i32>,
}

impl RecurringSlotsRequest {
    pub fn into_domain(self, default_group_capacity: i32) -> Result<RecurringRequest, AppError> {
        let weekdays = self.weekdays.iter()
            .map(|raw| raw.trim().parse::<Weekday>()
                .map_err(|_| AppError::Validation(format!("Invalid weekday '{}'", raw))))
            .collect::<Result<Vec<_>, _>>()?;

        let time_spec = match (self.time, self.start_hour, self.end_hour) {
            (Some(time), None, None) => TimeSpec::At(parse_time(&time)?),
            (None, Some(start_hour), Some(end_hour)) => TimeSpec::Hours { start_hour, end_hour },
            _ => return Err(AppError::Validation("Provide either 'time' or both 'start_hour' and 'end_hour'".into())),
        };

        Ok(RecurringRequest {
            start_date: parse_date(&self.start_date)?,
            weekdays,
            time_spec,
            service_types: self.service_types,
            weeks: self.weeks.map(Weeks::Count).unwrap_or(Weeks::Indefinite),
            group_capacity: self.group_capacity.unwrap_or(default_group_capacity),
        })
    }
}
