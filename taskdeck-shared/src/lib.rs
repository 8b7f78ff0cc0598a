//! # TaskDeck Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the TaskDeck API server and the recurring-task scheduler.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pooling and migrations
//! - `auth`: Password hashing, JWT tokens, request authentication
//! - `access`: Static permission table and the per-request access guard
//! - `audit`: Append-only audit log recorder
//! - `notify`: In-app notification creation (best-effort)
//! - `mentions`: Mention token scanning for comment bodies
//! - `mutation`: Task mutation service (create/update/delete/assign/comment)
//! - `reporting`: Org-scoped aggregation and CSV export

pub mod access;
pub mod audit;
pub mod auth;
pub mod db;
pub mod mentions;
pub mod models;
pub mod mutation;
pub mod notify;
pub mod reporting;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
