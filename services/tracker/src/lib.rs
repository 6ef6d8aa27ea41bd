//! Personal work time tracker.
//!
//! Records one check-in/check-out session per day, computes the expected
//! leave time and overtime against a fixed 10-hour threshold, aggregates
//! monthly statistics and sends cron-driven webhook reminders.

pub mod clients;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod scheduler;
pub mod settings;
pub mod shutdown;
pub mod state;
pub mod usecase;

pub use state::AppState;
