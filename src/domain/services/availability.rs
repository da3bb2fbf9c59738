use std::collections::BTreeMap;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use crate::domain::models::booking::Booking;
use crate::domain::models::slot::{ServiceType, Slot, SlotKey};
use crate::domain::services::local_time::format_time;
use crate::error::BookingConflict;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    NotOffered,
    Full,
    Exclusive,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ServiceAvailability {
    pub available: bool,
    pub current: i32,
    pub max: i32,
    pub user_reserved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AvailabilityView {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
    pub individual: ServiceAvailability,
    pub group: ServiceAvailability,
}

fn serialize_hhmm<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_time(*time))
}

impl AvailabilityView {
    pub fn service(&self, service_type: ServiceType) -> &ServiceAvailability {
        match service_type {
            ServiceType::Individual => &self.individual,
            ServiceType::Group => &self.group,
        }
    }

    /// Why `service_type` cannot be booked, as the conflict reported to the caller.
    pub fn refusal(&self, service_type: ServiceType) -> Option<BookingConflict> {
        let service = self.service(service_type);
        if service.available {
            return None;
        }
        Some(match service.reason {
            Some(UnavailableReason::Exclusive) => BookingConflict::ExclusiveTypeBooked(service_type.other()),
            Some(UnavailableReason::NotOffered) => BookingConflict::SlotNotOffered(service_type),
            Some(UnavailableReason::Full) | None => BookingConflict::SlotFull,
        })
    }
}

struct Tally<'a> {
    slot: Option<&'a Slot>,
    current: i32,
    user_reserved: bool,
}

impl Tally<'_> {
    fn exists(&self) -> bool {
        self.slot.is_some_and(Slot::is_offered)
    }

    fn max(&self) -> i32 {
        self.slot.map(|s| s.capacity.max(0)).unwrap_or(0)
    }

    fn has_room(&self) -> bool {
        self.exists() && self.current < self.max()
    }

    fn into_view(self, verdict: Result<(), UnavailableReason>) -> ServiceAvailability {
        let reason = match verdict {
            Ok(()) => None,
            Err(_) if !self.exists() => Some(UnavailableReason::NotOffered),
            Err(reason) => Some(reason),
        };
        ServiceAvailability {
            available: reason.is_none(),
            current: self.current,
            max: self.max(),
            user_reserved: self.user_reserved,
            reason,
            slot_id: self.slot.map(|s| s.id.clone()),
        }
    }
}

fn tally<'a>(
    key: SlotKey,
    service_type: ServiceType,
    slots: &'a [Slot],
    bookings: &[Booking],
    subject_id: Option<&str>,
) -> Tally<'a> {
    let slot = slots.iter().find(|s| s.key() == key && s.service_type == service_type);
    let mut current = 0;
    let mut user_reserved = false;

    for booking in bookings.iter().filter(|b| b.is_confirmed() && b.key() == key && b.service_type == service_type) {
        current += 1;
        if subject_id.is_some_and(|id| booking.subject_id == id) {
            user_reserved = true;
        }
    }

    Tally { slot, current, user_reserved }
}

/// Occupancy and bookability of both service types at one date/time.
///
/// Only confirmed bookings count. The two types are mutually exclusive:
/// an individual booking closes the key entirely, a group booking closes
/// the individual type while group seats remain. A zero-capacity row is
/// treated as absent.
pub fn resolve_availability(
    key: SlotKey,
    slots: &[Slot],
    bookings: &[Booking],
    subject_id: Option<&str>,
) -> AvailabilityView {
    let individual = tally(key, ServiceType::Individual, slots, bookings, subject_id);
    let group = tally(key, ServiceType::Group, slots, bookings, subject_id);

    let (individual_verdict, group_verdict) = if individual.current > 0 {
        (Err(UnavailableReason::Full), Err(UnavailableReason::Exclusive))
    } else if group.current > 0 {
        let group_verdict = if group.has_room() { Ok(()) } else { Err(UnavailableReason::Full) };
        (Err(UnavailableReason::Exclusive), group_verdict)
    } else {
        let verdict = |t: &Tally| if t.has_room() { Ok(()) } else { Err(UnavailableReason::Full) };
        (verdict(&individual), verdict(&group))
    };

    AvailabilityView {
        date: key.date,
        time: key.time,
        individual: individual.into_view(individual_verdict),
        group: group.into_view(group_verdict),
    }
}

/// One view per date/time that has at least one slot row, ordered chronologically.
pub fn group_by_key(slots: &[Slot], bookings: &[Booking], subject_id: Option<&str>) -> Vec<AvailabilityView> {
    let mut by_key: BTreeMap<SlotKey, (Vec<Slot>, Vec<Booking>)> = BTreeMap::new();

    for slot in slots {
        by_key.entry(slot.key()).or_default().0.push(slot.clone());
    }
    for booking in bookings.iter().filter(|b| b.is_confirmed()) {
        if let Some(entry) = by_key.get_mut(&booking.key()) {
            entry.1.push(booking.clone());
        }
    }

    by_key
        .into_iter()
        .map(|(key, (slots, bookings))| resolve_availability(key, &slots, &bookings, subject_id))
        .collect()
}
