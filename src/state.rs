use std::sync::Arc;
use chrono::Duration;
use crate::domain::ports::{
    BookingRepository, Clock, DependentRepository, SlotRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService,
    booking_service::BookingService,
    slot_cache::SlotCache,
    slot_generator::SlotGenerator,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub dependent_repo: Arc<dyn DependentRepository>,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub clock: Arc<dyn Clock>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub slot_generator: Arc<SlotGenerator>,
    pub slot_cache: Arc<SlotCache>,
}

impl AppState {
    pub fn new(
        config: Config,
        user_repo: Arc<dyn UserRepository>,
        dependent_repo: Arc<dyn DependentRepository>,
        slot_repo: Arc<dyn SlotRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(&config));
        let booking_service = Arc::new(BookingService::new(
            slot_repo.clone(),
            booking_repo.clone(),
            dependent_repo.clone(),
            clock.clone(),
            config.timezone,
        ));
        let slot_generator = Arc::new(SlotGenerator::new(slot_repo.clone(), clock.clone(), config.timezone));
        let slot_cache = Arc::new(SlotCache::new(
            Duration::seconds(config.slot_cache_ttl_secs as i64),
            clock.clone(),
        ));

        Self {
            config,
            user_repo,
            dependent_repo,
            slot_repo,
            booking_repo,
            clock,
            auth_service,
            booking_service,
            slot_generator,
            slot_cache,
        }
    }
}
