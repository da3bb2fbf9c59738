use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use parking_lot::RwLock;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use crate::domain::models::slot::Slot;
use crate::domain::ports::Clock;
use crate::error::AppError;

struct CacheEntry {
    stored_at: DateTime<Utc>,
    slots: Arc<Vec<Slot>>,
}

/// Slot lists per requested date range, served while younger than the TTL.
///
/// Only the slot ledger is cached. Bookings are always read fresh, so a stale
/// entry can at worst show a slot that an admin just removed or miss one that
/// was just created; every admin slot write calls `invalidate_all`.
pub struct SlotCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<(NaiveDate, NaiveDate), CacheEntry>>,
}

impl SlotCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { ttl, clock, entries: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, from: NaiveDate, to: NaiveDate) -> Option<Arc<Vec<Slot>>> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(&(from, to))
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.slots.clone())
    }

    pub fn put(&self, from: NaiveDate, to: NaiveDate, slots: Vec<Slot>) -> Arc<Vec<Slot>> {
        let slots = Arc::new(slots);
        let now = self.clock.now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| now - entry.stored_at < self.ttl);
        entries.insert((from, to), CacheEntry { stored_at: now, slots: slots.clone() });
        slots
    }

    pub fn invalidate_all(&self) {
        self.entries.write().clear();
        debug!("Slot cache invalidated");
    }

    pub async fn get_or_load<F, Fut>(&self, from: NaiveDate, to: NaiveDate, load: F) -> Result<Arc<Vec<Slot>>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Slot>, AppError>>,
    {
        if let Some(hit) = self.get(from, to) {
            return Ok(hit);
        }
        let slots = load().await?;
        Ok(self.put(from, to, slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::slot::ServiceType;
    use crate::infra::clock::FixedClock;
    use chrono::{NaiveTime, TimeZone};

    fn range() -> (NaiveDate, NaiveDate) {
        (NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), NaiveDate::from_ymd_opt(2025, 6, 8).unwrap())
    }

    fn sample() -> Vec<Slot> {
        vec![Slot::new(range().0, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), ServiceType::Group, 5)]
    }

    #[test]
    fn test_entries_expire_with_clock() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()));
        let cache = SlotCache::new(Duration::seconds(60), clock.clone());
        let (from, to) = range();

        cache.put(from, to, sample());
        assert_eq!(cache.get(from, to).map(|s| s.len()), Some(1));

        clock.advance(Duration::seconds(59));
        assert!(cache.get(from, to).is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get(from, to).is_none());
    }

    #[test]
    fn test_invalidate_all_drops_entries() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let cache = SlotCache::new(Duration::seconds(60), clock);
        let (from, to) = range();

        cache.put(from, to, sample());
        cache.invalidate_all();
        assert!(cache.get(from, to).is_none());
    }

    #[test]
    fn test_cache_survives_panic_while_locked() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let cache = SlotCache::new(Duration::seconds(60), clock);
        let (from, to) = range();

        std::thread::scope(|scope| {
            let crashed = scope.spawn(|| {
                let _guard = cache.entries.write();
                panic!("writer crashed");
            });
            assert!(crashed.join().is_err());
        });

        cache.put(from, to, sample());
        assert!(cache.get(from, to).is_some());
        cache.invalidate_all();
        assert!(cache.get(from, to).is_none());
    }

    #[tokio::test]
    async fn test_get_or_load_only_loads_on_miss() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let cache = SlotCache::new(Duration::seconds(60), clock);
        let (from, to) = range();

        let first = cache.get_or_load(from, to, || async { Ok(sample()) }).await.unwrap();
        let second = cache
            .get_or_load(from, to, || async { Err(AppError::Internal) })
            .await
            .unwrap();
        assert_eq!(first.len(), second.len());
    }
}
