//! Time and timestamp helpers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// UTC timestamp used for tick times, preview slots, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Resolve an IANA timezone name (e.g. `"Europe/Paris"`).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimezone`] when the name is unknown.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    Tz::from_str(name).map_err(|_| ValidationError::InvalidTimezone(name.to_string()))
}
