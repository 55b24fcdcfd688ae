//! HTTP route handlers.

pub mod banners;
pub mod cart;
pub mod connections;
pub mod dashboard;
pub mod health;
pub mod me;
pub mod metrics;
pub mod orders;
