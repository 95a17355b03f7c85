//! Seed description of a virtual entity.

use serde::Deserialize;

/// Initial state of one entity hosted by [`crate::VirtualHost`].
///
/// Deserializes from configuration as `{ entity_id = "...", state = "..." }`;
/// `state` defaults to `"off"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VirtualEntity {
    pub entity_id: String,
    #[serde(default = "default_state")]
    pub state: String,
}

impl VirtualEntity {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
        }
    }
}

fn default_state() -> String {
    "off".to_string()
}
