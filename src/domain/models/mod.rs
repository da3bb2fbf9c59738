pub mod auth;
pub mod booking;
pub mod dependent;
pub mod slot;
pub mod subject;
pub mod user;
