pub mod admin;
pub mod auth;
pub mod booking;
pub mod dependent;
pub mod health;
pub mod slot;
