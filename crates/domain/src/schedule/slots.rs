//! Slots: the 48 on/off half-hour windows of a schedule's day.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::slot::SLOTS_PER_DAY;

/// Exactly [`SLOTS_PER_DAY`] booleans, one per half hour starting at midnight.
///
/// The length invariant is enforced on construction and on deserialization,
/// so a `Slots` value can always be indexed with any slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<bool>", into = "Vec<bool>")]
pub struct Slots([bool; SLOTS_PER_DAY]);

impl Default for Slots {
    fn default() -> Self {
        Self([false; SLOTS_PER_DAY])
    }
}

impl Slots {
    /// All slots inactive.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Active exactly on the half-open slot range `range`.
    #[must_use]
    pub fn active_range(range: std::ops::Range<usize>) -> Self {
        let mut slots = Self::none();
        for index in range.filter(|i| *i < SLOTS_PER_DAY) {
            slots.0[index] = true;
        }
        slots
    }

    /// Whether slot `index` is active. Out-of-range indices are inactive.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|active| **active).count()
    }
}

impl TryFrom<Vec<bool>> for Slots {
    type Error = ValidationError;

    fn try_from(value: Vec<bool>) -> Result<Self, Self::Error> {
        let actual = value.len();
        <[bool; SLOTS_PER_DAY]>::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::SlotCount {
                expected: SLOTS_PER_DAY,
                actual,
            })
    }
}

impl From<Slots> for Vec<bool> {
    fn from(value: Slots) -> Self {
        value.0.to_vec()
    }
}
