pub mod auth_service;
pub mod availability;
pub mod booking_service;
pub mod local_time;
pub mod slot_cache;
pub mod slot_generator;
