//! # timer24h-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ScheduleStore`: load & save the schedule set
//!   - `StateRegistry`: read entity states, subscribe to their changes
//!   - `Actuator`: switch a target entity on or off
//!   - `EventPublisher`: broadcast `schedule_updated` notifications
//!   - `Clock`: current wall-clock time
//! - Drive schedules:
//!   - `ScheduleEngine`: per-schedule reconciliation passes
//!   - `ConditionDispatcher`: re-runs schedules when a condition entity changes
//!   - `SlotTicker`: wakes the engine on every half-hour boundary
//! - Define the **driving/inbound port** `ScheduleService` (commands & queries)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `timer24h-domain` only (plus `tokio` for locks, tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod engine;
pub mod event_bus;
pub mod ports;
pub mod services;
pub mod slot_ticker;

#[cfg(test)]
mod testing;
