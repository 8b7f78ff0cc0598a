/// Route handlers
///
/// One module per resource group. Handlers stay thin: parse the request,
/// check org access, call into `taskdeck-shared`, wrap the result in the
/// response envelope.

pub mod audit_logs;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod reports;
pub mod tasks;
pub mod templates;
pub mod users;
