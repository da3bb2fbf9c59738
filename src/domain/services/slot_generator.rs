use std::collections::BTreeSet;
use std::sync::Arc;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use crate::domain::models::slot::{ServiceType, Slot};
use crate::domain::ports::{Clock, SlotRepository};
use crate::domain::services::local_time::{date_for_weekday, hourly_times, local_now};
use crate::error::AppError;

/// Hard ceiling on recurring expansion, whatever the request asks for.
pub const MAX_HORIZON_WEEKS: u32 = 16;
pub const CHUNK_SIZE: usize = 50;
/// Above this many rows the single-request fast path is not attempted.
pub const MAX_SINGLE_BATCH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    At(NaiveTime),
    /// Hourly slots in `[start_hour, end_hour)`.
    Hours { start_hour: u32, end_hour: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weeks {
    Count(u32),
    Indefinite,
}

impl Weeks {
    pub fn horizon(&self) -> u32 {
        match self {
            Weeks::Count(n) => (*n).min(MAX_HORIZON_WEEKS),
            Weeks::Indefinite => MAX_HORIZON_WEEKS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecurringRequest {
    pub start_date: NaiveDate,
    pub weekdays: Vec<Weekday>,
    pub time_spec: TimeSpec,
    pub service_types: Vec<ServiceType>,
    pub weeks: Weeks,
    pub group_capacity: i32,
}

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub created: u64,
    pub skipped: u64,
    pub failed: u64,
}

fn validate(request: &RecurringRequest) -> Result<(), AppError> {
    if request.weekdays.is_empty() {
        return Err(AppError::Validation("Select at least one weekday".into()));
    }
    if request.service_types.is_empty() {
        return Err(AppError::Validation("Select at least one service type".into()));
    }
    if request.weeks == Weeks::Count(0) {
        return Err(AppError::Validation("Number of weeks must be at least 1".into()));
    }
    if request.service_types.contains(&ServiceType::Group) && request.group_capacity < 1 {
        return Err(AppError::Validation("Group capacity must be at least 1".into()));
    }
    Ok(())
}

/// Stages the concrete slot rows of a recurring request.
///
/// Slots starting strictly before `now` are dropped, and expansion stops at
/// `MAX_HORIZON_WEEKS` from the start date. Individual slots always get one seat.
pub fn expand(request: &RecurringRequest, now: NaiveDateTime) -> Result<Vec<Slot>, AppError> {
    validate(request)?;

    let times = match request.time_spec {
        TimeSpec::At(time) => vec![time],
        TimeSpec::Hours { start_hour, end_hour } => hourly_times(start_hour, end_hour)?,
    };

    let mut weekdays = request.weekdays.clone();
    weekdays.sort_by_key(|d| d.num_days_from_monday());
    weekdays.dedup();
    let service_types: BTreeSet<ServiceType> = request.service_types.iter().copied().collect();
    let out_of_range = || AppError::Validation(format!("Start date {} is too far in the future", request.start_date));
    let horizon_end = request.start_date
        .checked_add_signed(Duration::weeks(MAX_HORIZON_WEEKS as i64))
        .ok_or_else(out_of_range)?;

    let mut staged = Vec::new();
    for week in 0..request.weeks.horizon() {
        for weekday in &weekdays {
            let date = date_for_weekday(request.start_date, week, *weekday).ok_or_else(out_of_range)?;
            if date >= horizon_end {
                continue;
            }

            for time in &times {
                if date.and_time(*time) < now {
                    continue;
                }
                for service_type in &service_types {
                    let capacity = match service_type {
                        ServiceType::Individual => 1,
                        ServiceType::Group => request.group_capacity,
                    };
                    staged.push(Slot::new(date, *time, *service_type, capacity));
                }
            }
        }
    }

    staged.sort_by_key(|s| (s.date, s.time, s.service_type));
    Ok(staged)
}

pub struct SlotGenerator {
    slot_repo: Arc<dyn SlotRepository>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl SlotGenerator {
    pub fn new(slot_repo: Arc<dyn SlotRepository>, clock: Arc<dyn Clock>, timezone: Tz) -> Self {
        Self { slot_repo, clock, timezone }
    }

    /// Additive only: existing rows are never touched, colliding keys are counted as skipped.
    pub async fn generate_recurring_slots(&self, request: &RecurringRequest) -> Result<GenerationSummary, AppError> {
        if let Weeks::Count(n) = request.weeks
            && n > MAX_HORIZON_WEEKS {
            info!("Recurring request for {} weeks capped at {}", n, MAX_HORIZON_WEEKS);
        }

        let staged = expand(request, local_now(self.clock.as_ref(), self.timezone))?;
        if staged.is_empty() {
            info!("Recurring request produced no future slots");
            return Ok(GenerationSummary::default());
        }

        if staged.len() > MAX_SINGLE_BATCH {
            info!("Staged {} slots, inserting in chunks of {}", staged.len(), CHUNK_SIZE);
            return self.insert_chunked(staged).await;
        }

        match self.slot_repo.insert_batch(&staged).await {
            Ok(created) => {
                info!("Bulk inserted {} slots", created);
                Ok(GenerationSummary { created, skipped: staged.len() as u64 - created, failed: 0 })
            }
            Err(e) if e.is_unique_violation() => {
                info!("Bulk insert hit existing slots, retrying in chunks");
                self.insert_chunked(staged).await
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_chunked(&self, staged: Vec<Slot>) -> Result<GenerationSummary, AppError> {
        let total = staged.len() as u64;
        let mut set = JoinSet::new();

        for chunk in staged.chunks(CHUNK_SIZE) {
            let repo = self.slot_repo.clone();
            let chunk = chunk.to_vec();
            set.spawn(async move {
                let len = chunk.len() as u64;
                (len, repo.insert_batch_skip_existing(&chunk).await)
            });
        }

        let mut summary = GenerationSummary::default();
        let mut last_error = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((len, Ok(inserted))) => {
                    summary.created += inserted;
                    summary.skipped += len.saturating_sub(inserted);
                }
                Ok((len, Err(e))) => {
                    warn!("Chunk of {} slots failed: {}", len, e);
                    last_error = Some(e);
                }
                Err(join_err) => error!("Chunk insert task aborted: {}", join_err),
            }
        }
        summary.failed = total.saturating_sub(summary.created + summary.skipped);

        if summary.failed == total {
            error!("Every chunk of the recurring generation failed");
            return Err(last_error.unwrap_or(AppError::InternalWithMsg("slot generation failed".into())));
        }

        info!(
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "Recurring slot generation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(weeks: Weeks) -> RecurringRequest {
        RecurringRequest {
            // Monday
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            weekdays: vec![Weekday::Mon, Weekday::Thu],
            time_spec: TimeSpec::Hours { start_hour: 9, end_hour: 12 },
            service_types: vec![ServiceType::Individual, ServiceType::Group],
            weeks,
            group_capacity: 6,
        }
    }

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_expansion_counts_and_capacities() {
        let staged = expand(&request(Weeks::Count(2)), at((2025, 6, 1), 0, 0)).unwrap();

        // 2 weeks * 2 days * 3 hours * 2 types
        assert_eq!(staged.len(), 24);
        assert!(staged.iter().filter(|s| s.service_type == ServiceType::Individual).all(|s| s.capacity == 1));
        assert!(staged.iter().filter(|s| s.service_type == ServiceType::Group).all(|s| s.capacity == 6));
        assert_eq!(staged[0].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(staged.last().unwrap().date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
    }

    #[test]
    fn test_past_slots_are_never_staged() {
        let now = at((2025, 6, 2), 10, 30);
        let staged = expand(&request(Weeks::Count(1)), now).unwrap();

        assert!(staged.iter().all(|s| s.starts_at() >= now));
        // Monday 11:00 survives, 09:00 and 10:00 do not; Thursday keeps all three hours.
        assert_eq!(staged.len(), (1 + 3) * 2);
    }

    #[test]
    fn test_indefinite_is_capped_at_sixteen_weeks() {
        let req = request(Weeks::Indefinite);
        let staged = expand(&req, at((2025, 1, 1), 0, 0)).unwrap();
        let limit = req.start_date + Duration::weeks(MAX_HORIZON_WEEKS as i64);

        assert!(staged.iter().all(|s| s.date < limit));
        assert_eq!(staged.len(), 16 * 2 * 3 * 2);

        let oversized = expand(&request(Weeks::Count(52)), at((2025, 1, 1), 0, 0)).unwrap();
        assert_eq!(oversized.len(), staged.len());
    }

    #[test]
    fn test_duplicate_inputs_stage_once() {
        let mut req = request(Weeks::Count(1));
        req.weekdays = vec![Weekday::Mon, Weekday::Mon];
        req.service_types = vec![ServiceType::Group, ServiceType::Group];
        req.time_spec = TimeSpec::At(NaiveTime::from_hms_opt(18, 0, 0).unwrap());

        let staged = expand(&req, at((2025, 1, 1), 0, 0)).unwrap();
        assert_eq!(staged.len(), 1);
    }

    #[test]
    fn test_invalid_requests_are_rejected() {
        let mut req = request(Weeks::Count(0));
        assert!(matches!(expand(&req, at((2025, 1, 1), 0, 0)), Err(AppError::Validation(_))));

        req.weeks = Weeks::Count(1);
        req.weekdays.clear();
        assert!(matches!(expand(&req, at((2025, 1, 1), 0, 0)), Err(AppError::Validation(_))));

        let mut req = request(Weeks::Count(1));
        req.group_capacity = 0;
        assert!(matches!(expand(&req, at((2025, 1, 1), 0, 0)), Err(AppError::Validation(_))));

        let mut req = request(Weeks::Count(1));
        req.time_spec = TimeSpec::Hours { start_hour: 14, end_hour: 10 };
        assert!(matches!(expand(&req, at((2025, 1, 1), 0, 0)), Err(AppError::Validation(_))));

        let mut req = request(Weeks::Count(1));
        req.start_date = NaiveDate::MAX;
        assert!(matches!(expand(&req, at((2025, 1, 1), 0, 0)), Err(AppError::Validation(_))));
    }
}
