//! Small background service that reminds you to clock in and clock out.
//! Reminders are checked once per minute against two configured times of day, notifications go
//! through the platform's own notification mechanism, and a counter of reminder days survives
//! restarts.
//!

pub mod cli;
pub mod notification;
pub mod scheduler;
pub mod settings;
pub mod utils;
