//! Condition: a predicate over another entity's state, with an override policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const TRUTHY_EXPECTED: [&str; 4] = ["true", "on", "1", "yes"];
const TRUTHY_OBSERVED: [&str; 5] = ["on", "true", "1", "yes", "home"];
const FALSY_EXPECTED: [&str; 4] = ["false", "off", "0", "no"];
const FALSY_OBSERVED: [&str; 6] = ["off", "false", "0", "no", "away", "not_home"];

/// How an unmet condition affects the schedule's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Withhold any action while unmet.
    #[default]
    Skip,
    /// Actively turn the target off while unmet. Overrides every other policy.
    ForceOff,
    /// Withhold any action while unmet, like [`Skip`](Self::Skip) but lower priority.
    Defer,
}

impl Policy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::ForceOff => "force_off",
            Self::Defer => "defer",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "force_off" => Ok(Self::ForceOff),
            "defer" => Ok(Self::Defer),
            other => Err(ValidationError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Gate on the observed state of `entity_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub entity_id: String,
    /// Expected state; `None` means the condition always holds.
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub policy: Policy,
}

impl Condition {
    /// Build a validated condition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyConditionEntityId`] when `entity_id` is empty.
    pub fn new(
        entity_id: impl Into<String>,
        expected: Option<String>,
        policy: Policy,
    ) -> Result<Self, ValidationError> {
        let condition = Self {
            entity_id: entity_id.into(),
            expected,
            policy,
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyConditionEntityId`] when `entity_id` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyConditionEntityId);
        }
        Ok(())
    }

    /// Whether `observed` satisfies this condition.
    ///
    /// Boolean-like expectations (`on`, `true`, `1`, `yes` and their
    /// opposites) compare case-insensitively against a family of equivalent
    /// states, including presence states such as `home` and `not_home`.
    /// Anything else must match exactly.
    #[must_use]
    pub fn is_met(&self, observed: &str) -> bool {
        let Some(expected) = self.expected.as_deref() else {
            return true;
        };

        let expected_lower = expected.to_lowercase();
        let observed_lower = observed.to_lowercase();
        if TRUTHY_EXPECTED.contains(&expected_lower.as_str()) {
            TRUTHY_OBSERVED.contains(&observed_lower.as_str())
        } else if FALSY_EXPECTED.contains(&expected_lower.as_str()) {
            FALSY_OBSERVED.contains(&observed_lower.as_str())
        } else {
            observed == expected
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expected {
            Some(expected) => write!(f, "{} == {expected} ({})", self.entity_id, self.policy),
            None => write!(f, "{} (any, {})", self.entity_id, self.policy),
        }
    }
}
