//! # timer24h-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the schedule commands and queries
//!   (`/api/schedules`, `/api/states`, `/api/reconcile`, …)
//! - Stream every `schedule_updated` notification as **Server-Sent Events**
//!   (`/api/events/stream`)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into status codes with a JSON `{ "error": … }` body
//!
//! ## Dependency rule
//! Depends on `timer24h-app` (for port traits and services) and `timer24h-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
