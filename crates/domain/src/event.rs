//! Domain events published after every reconciliation pass.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Name under which [`ScheduleUpdated`] is exposed to observers.
pub const SCHEDULE_UPDATED: &str = "schedule_updated";

/// A schedule was reconciled, whether or not the target was actuated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleUpdated {
    pub schedule_id: String,
    pub desired_state: Option<bool>,
    pub last_condition_evaluation: Option<String>,
    pub timestamp: Timestamp,
}
