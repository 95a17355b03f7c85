//! Schedule: a recurring 24-hour on/off timetable bound to one target entity.
//!
//! A [`Schedule`] tiles the local day into 48 half-hour [`Slots`], gates its
//! active slots with [`Condition`]s, and can be switched off wholesale with
//! the `enabled` flag. Everything here is pure: the decision functions take
//! the observed world as arguments and never perform IO.

mod condition;
mod slots;

use std::collections::{BTreeSet, HashMap};

pub use condition::{Condition, Policy};
pub use slots::Slots;

use serde::{Deserialize, Serialize};

use crate::error::{Timer24hError, ValidationError};
use crate::slot::SLOTS_PER_DAY;
use crate::time::parse_timezone;

/// State assumed for a condition entity the host knows nothing about.
pub const UNKNOWN_STATE: &str = "unknown";

/// A named on/off timetable for `target_entity_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: String,
    pub target_entity_id: String,
    #[serde(default)]
    pub slots: Slots,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// IANA zone name; `None` runs the schedule in the process default zone.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

fn default_enabled() -> bool {
    true
}

/// Outcome of [`Schedule::evaluate_conditions`].
///
/// `decision` is `None` when an unmet `skip` or `defer` condition withholds
/// any action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Option<bool>,
    pub reason: String,
}

impl Evaluation {
    fn new(decision: Option<bool>, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
        }
    }
}

impl Schedule {
    /// Create a builder for constructing a [`Schedule`].
    #[must_use]
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// The slot count is guaranteed by [`Slots`] itself.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] when:
    /// - `schedule_id` is empty ([`ValidationError::EmptyScheduleId`])
    /// - `target_entity_id` is empty ([`ValidationError::EmptyTargetEntityId`])
    /// - `timezone` is not a known zone ([`ValidationError::InvalidTimezone`])
    /// - a condition has an empty entity id ([`ValidationError::EmptyConditionEntityId`])
    pub fn validate(&self) -> Result<(), Timer24hError> {
        if self.schedule_id.is_empty() {
            return Err(ValidationError::EmptyScheduleId.into());
        }
        if self.target_entity_id.is_empty() {
            return Err(ValidationError::EmptyTargetEntityId.into());
        }
        if let Some(name) = &self.timezone {
            parse_timezone(name)?;
        }
        for condition in &self.conditions {
            condition.validate()?;
        }
        Ok(())
    }

    /// Whether the schedule wants its target on during slot `index`.
    ///
    /// Always `false` for a disabled schedule and for indices outside `0..48`.
    #[must_use]
    pub fn is_active_at_slot(&self, index: i64) -> bool {
        if !self.enabled {
            return false;
        }
        usize::try_from(index)
            .ok()
            .filter(|i| *i < SLOTS_PER_DAY)
            .is_some_and(|i| self.slots.is_active(i))
    }

    /// Decide from the observed condition states.
    ///
    /// Unmet conditions are grouped by policy and the decision follows the
    /// fixed priority `force_off` > `skip` > `defer`, independent of the order
    /// in which conditions were declared. Entities missing from `states` are
    /// observed as [`UNKNOWN_STATE`].
    #[must_use]
    pub fn evaluate_conditions(&self, states: &HashMap<String, String>) -> Evaluation {
        if self.conditions.is_empty() {
            return Evaluation::new(Some(true), "No conditions");
        }

        let mut force_off = Vec::new();
        let mut skip = Vec::new();
        let mut defer = Vec::new();

        for condition in &self.conditions {
            let observed = states
                .get(&condition.entity_id)
                .map_or(UNKNOWN_STATE, String::as_str);
            if condition.is_met(observed) {
                continue;
            }
            let bucket = match condition.policy {
                Policy::ForceOff => &mut force_off,
                Policy::Skip => &mut skip,
                Policy::Defer => &mut defer,
            };
            bucket.push(condition.entity_id.as_str());
        }

        if !force_off.is_empty() {
            Evaluation::new(Some(false), format!("Force off: {}", force_off.join(", ")))
        } else if !skip.is_empty() {
            Evaluation::new(None, format!("Skip: {}", skip.join(", ")))
        } else if !defer.is_empty() {
            Evaluation::new(None, format!("Defer: {}", defer.join(", ")))
        } else {
            Evaluation::new(Some(true), "All conditions met")
        }
    }

    /// Distinct entity ids referenced by this schedule's conditions.
    #[must_use]
    pub fn condition_entities(&self) -> BTreeSet<String> {
        self.conditions
            .iter()
            .map(|condition| condition.entity_id.clone())
            .collect()
    }

    /// Whether at least one condition observes `entity_id`.
    #[must_use]
    pub fn references(&self, entity_id: &str) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.entity_id == entity_id)
    }
}

/// Step-by-step builder for [`Schedule`].
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    schedule_id: Option<String>,
    target_entity_id: Option<String>,
    slots: Option<Slots>,
    enabled: Option<bool>,
    timezone: Option<String>,
    conditions: Vec<Condition>,
}

impl ScheduleBuilder {
    #[must_use]
    pub fn schedule_id(mut self, id: impl Into<String>) -> Self {
        self.schedule_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn target_entity_id(mut self, id: impl Into<String>) -> Self {
        self.target_entity_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn slots(mut self, slots: Slots) -> Self {
        self.slots = Some(slots);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn timezone(mut self, timezone: Option<String>) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Consume the builder, validate, and return a [`Schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] if an id is missing or empty,
    /// the timezone is unknown, or a condition is invalid.
    pub fn build(self) -> Result<Schedule, Timer24hError> {
        let schedule = Schedule {
            schedule_id: self.schedule_id.unwrap_or_default(),
            target_entity_id: self.target_entity_id.unwrap_or_default(),
            slots: self.slots.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            timezone: self.timezone,
            conditions: self.conditions,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
