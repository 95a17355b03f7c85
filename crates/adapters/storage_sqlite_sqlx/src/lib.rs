//! # timer24h-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`ScheduleStore`](timer24h_app::ports::ScheduleStore) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between schedules and `schedules` table rows
//!
//! ## Dependency rule
//! Depends on `timer24h-app` (for port traits) and `timer24h-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod schedule_store;

pub use pool::{Config, Database};
pub use schedule_store::SqliteScheduleStore;
