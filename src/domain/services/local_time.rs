use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use crate::domain::ports::Clock;
use crate::error::AppError;

/// Wall-clock "now" at the gym. Slot dates and times are local, never UTC.
pub fn local_now(clock: &dyn Clock, tz: Tz) -> NaiveDateTime {
    clock.now().with_timezone(&tz).naive_local()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", raw)))
}

/// Accepts `HH:MM` and `HH:MM:SS`; slots have minute precision.
pub fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    let raw = raw.trim();
    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time '{}' (expected HH:MM)", raw)))?;

    if time.second() != 0 || time.nanosecond() != 0 {
        return Err(AppError::Validation("Slot times have minute precision".into()));
    }
    Ok(time)
}

/// The date of `weekday` inside the `week`-th week counted from `start`.
/// Week 0 covers `start ..= start + 6 days`. `None` past the end of the calendar.
pub fn date_for_weekday(start: NaiveDate, week: u32, weekday: Weekday) -> Option<NaiveDate> {
    let offset = (weekday.num_days_from_monday() as i64 - start.weekday().num_days_from_monday() as i64).rem_euclid(7);
    start.checked_add_signed(Duration::days(7 * week as i64 + offset))
}

/// Hourly boundaries in `[start_hour, end_hour)`.
pub fn hourly_times(start_hour: u32, end_hour: u32) -> Result<Vec<NaiveTime>, AppError> {
    if start_hour >= end_hour || end_hour > 24 {
        return Err(AppError::Validation(format!(
            "Invalid hour range {}..{} (expected start < end <= 24)", start_hour, end_hour
        )));
    }
    Ok((start_hour..end_hour)
        .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
        .collect())
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
