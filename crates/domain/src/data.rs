//! Timer24hData: the aggregate root holding every schedule.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Timer24hError, ValidationError};
use crate::schedule::Schedule;

/// All schedules, keyed by `schedule_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer24hData {
    #[serde(default)]
    pub schedules: HashMap<String, Schedule>,
}

impl Timer24hData {
    /// Insert or replace a schedule under its own id.
    pub fn upsert(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.schedule_id.clone(), schedule);
    }

    /// Remove a schedule, returning whether it existed.
    pub fn remove(&mut self, schedule_id: &str) -> bool {
        self.schedules.remove(schedule_id).is_some()
    }

    #[must_use]
    pub fn get(&self, schedule_id: &str) -> Option<&Schedule> {
        self.schedules.get(schedule_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Schedules driving `entity_id`, sorted by schedule id.
    #[must_use]
    pub fn schedules_for_target(&self, entity_id: &str) -> Vec<&Schedule> {
        let mut found: Vec<_> = self
            .schedules
            .values()
            .filter(|schedule| schedule.target_entity_id == entity_id)
            .collect();
        found.sort_by(|a, b| a.schedule_id.cmp(&b.schedule_id));
        found
    }

    /// Every entity id referenced by any condition of any schedule.
    #[must_use]
    pub fn condition_entities(&self) -> BTreeSet<String> {
        self.schedules
            .values()
            .flat_map(Schedule::condition_entities)
            .collect()
    }

    /// Check that every key matches its schedule and every schedule is valid.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] for the first offending schedule.
    /// A key that differs from the contained id reports
    /// [`ValidationError::EmptyScheduleId`] when the key is empty and
    /// [`ValidationError::ScheduleIdMismatch`] otherwise.
    pub fn validate(&self) -> Result<(), Timer24hError> {
        for (key, schedule) in &self.schedules {
            if key.is_empty() {
                return Err(ValidationError::EmptyScheduleId.into());
            }
            if *key != schedule.schedule_id {
                return Err(ValidationError::ScheduleIdMismatch {
                    key: key.clone(),
                    schedule_id: schedule.schedule_id.clone(),
                }
                .into());
            }
            schedule.validate()?;
        }
        Ok(())
    }
}

impl FromIterator<Schedule> for Timer24hData {
    fn from_iter<T: IntoIterator<Item = Schedule>>(iter: T) -> Self {
        let mut data = Self::default();
        for schedule in iter {
            data.upsert(schedule);
        }
        data
    }
}
