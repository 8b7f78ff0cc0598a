//! # TaskDeck API Server
//!
//! REST API for TaskDeck: multi-tenant task management with role-based
//! access control, activity feeds, notifications, audit logging, and
//! reporting.
//!
//! The heavy lifting (models, access control, mutation service) lives in
//! `taskdeck-shared`; this crate owns the HTTP surface: configuration,
//! routing, request/response shapes, and error-to-status mapping.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
