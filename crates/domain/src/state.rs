//! Per-schedule runtime state kept by the reconciliation engine.

use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// What the engine currently thinks about one schedule.
///
/// Created when a schedule is registered and dropped when it is removed.
/// `desired_state` latches: skip and defer decisions leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Working copy of the schedule, refreshed on every mutation.
    pub schedule: Schedule,
    /// `None` until a pass produces an on/off decision.
    pub desired_state: Option<bool>,
    /// Last value this schedule successfully pushed to its target.
    ///
    /// Schedules sharing a target share one de-duplication record in the
    /// engine; this copy only reflects writes made on behalf of this
    /// schedule and may lag behind it.
    pub last_applied_state: Option<bool>,
    /// Human-readable reason of the last pass; `None` before the first pass.
    pub last_condition_evaluation: Option<String>,
}

impl ScheduleState {
    #[must_use]
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            desired_state: None,
            last_applied_state: None,
            last_condition_evaluation: None,
        }
    }
}
