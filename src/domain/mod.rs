// Domain layer - Tracker models and pure logic
pub mod counter;
pub mod dashboard;
pub mod incident;
pub mod session;
pub mod timer;
pub mod weekly;
