// Application layer - Use cases and the ports they depend on
pub mod auth_service;
pub mod counter_service;
pub mod errors;
pub mod history_store;
pub mod identity_provider;
pub mod incident_repository;
pub mod live_feed;
pub mod notices;
pub mod record_service;
pub mod statistics_service;
pub mod streaming_service;
pub mod timer_service;

#[cfg(test)]
pub mod testing;
