//! # TaskDeck Scheduler
//!
//! Periodic job that materializes recurring tasks. Runs separately from
//! the API server and shares nothing with it beyond the database.

pub mod recurring;
