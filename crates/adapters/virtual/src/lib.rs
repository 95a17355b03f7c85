//! # timer24h-adapter-virtual
//!
//! Virtual host for demos and tests: an in-memory registry of entity states
//! that the scheduler can read, watch and drive.
//!
//! ## Behaviour
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `get_state` | Stored state string, `None` for unknown entities |
//! | `set_state` | Stores the value; notifies watchers when it changed |
//! | `set_power` | `"on"` / `"off"` through `set_state`; unknown ids are rejected |
//! | `subscribe` | Receiver of changed entity ids; dropping it unsubscribes |
//!
//! ## Dependency rule
//!
//! Depends on `timer24h-app` (port traits) and `timer24h-domain` only.

mod entity;

pub use entity::VirtualEntity;

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use timer24h_app::ports::{Actuator, StateRegistry, StateSubscription};
use timer24h_domain::error::{ActuationError, Timer24hError};

type Watcher = (BTreeSet<String>, mpsc::UnboundedSender<String>);

/// In-memory host implementing [`StateRegistry`] and [`Actuator`].
#[derive(Default)]
pub struct VirtualHost {
    states: Mutex<HashMap<String, String>>,
    watchers: Mutex<Vec<Watcher>>,
}

impl VirtualHost {
    /// Create a host knowing exactly `entities`.
    #[must_use]
    pub fn new(entities: impl IntoIterator<Item = VirtualEntity>) -> Self {
        let states = entities
            .into_iter()
            .map(|entity| (entity.entity_id, entity.state))
            .collect();
        Self {
            states: Mutex::new(states),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Ids of every known entity, sorted.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.lock_states().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Store `state` for `entity_id`, creating the entity if needed.
    ///
    /// Watchers of the entity are notified only when the value changed.
    /// Returns whether it did.
    pub fn set_state(&self, entity_id: &str, state: &str) -> bool {
        let previous = self
            .lock_states()
            .insert(entity_id.to_string(), state.to_string());
        if previous.as_deref() == Some(state) {
            return false;
        }
        tracing::debug!(entity_id, state, "virtual entity changed");

        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        watchers.retain(|(entities, sender)| {
            if sender.is_closed() {
                return false;
            }
            if entities.contains(entity_id) {
                // A send only fails once the receiver is gone.
                return sender.send(entity_id.to_string()).is_ok();
            }
            true
        });
        true
    }

    /// Number of subscriptions still held by someone.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, sender)| !sender.is_closed())
            .count()
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateRegistry for VirtualHost {
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<String>> + Send {
        let state = self.lock_states().get(entity_id).cloned();
        async { state }
    }

    fn subscribe(
        &self,
        entity_ids: &BTreeSet<String>,
    ) -> impl Future<Output = Result<StateSubscription, Timer24hError>> + Send {
        let (sender, subscription) = StateSubscription::channel();
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((entity_ids.clone(), sender));
        async { Ok(subscription) }
    }
}

impl Actuator for VirtualHost {
    fn set_power(
        &self,
        entity_id: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send {
        let known = self.lock_states().contains_key(entity_id);
        let result = if known {
            self.set_state(entity_id, if on { "on" } else { "off" });
            Ok(())
        } else {
            Err(ActuationError::UnknownEntity(entity_id.to_string()))
        };
        async { result }
    }
}
