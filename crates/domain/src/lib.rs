//! # timer24h-domain
//!
//! Pure domain model for the timer24h half-hour scheduler.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps, timezone parsing
//! - The **slot clock**: mapping wall-clock time onto 48 half-hour slots
//! - Define **Schedules** (48-slot timetables bound to a target entity)
//! - Define **Conditions** and their override **Policies**
//! - Decide on/off from observed condition states
//! - Define runtime **schedule state** and the **events** emitted per pass
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod slot;
pub mod time;

pub mod data;
pub mod event;
pub mod schedule;
pub mod state;
