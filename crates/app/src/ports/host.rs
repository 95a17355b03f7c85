//! Host ports: the entity registry and the actuation mechanism.
//!
//! The host owns every entity the scheduler observes or drives. The
//! scheduler only ever reads state strings, listens for changes to a set of
//! entities, and asks for a target to be switched on or off.

use std::collections::BTreeSet;
use std::future::Future;

use tokio::sync::mpsc;

use timer24h_domain::error::{ActuationError, Timer24hError};

/// Read access to the host's entity states plus change notifications.
pub trait StateRegistry {
    /// Current state of `entity_id`, or `None` when the host does not know it.
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<String>> + Send;

    /// Receive the id of every entity in `entity_ids` whose state changes.
    ///
    /// Notifications stop when the returned subscription is dropped.
    fn subscribe(
        &self,
        entity_ids: &BTreeSet<String>,
    ) -> impl Future<Output = Result<StateSubscription, Timer24hError>> + Send;
}

/// Switches a target entity on or off.
pub trait Actuator {
    fn set_power(
        &self,
        entity_id: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send;
}

impl<T: StateRegistry + Send + Sync> StateRegistry for std::sync::Arc<T> {
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<String>> + Send {
        (**self).get_state(entity_id)
    }

    fn subscribe(
        &self,
        entity_ids: &BTreeSet<String>,
    ) -> impl Future<Output = Result<StateSubscription, Timer24hError>> + Send {
        (**self).subscribe(entity_ids)
    }
}

impl<T: Actuator + Send + Sync> Actuator for std::sync::Arc<T> {
    fn set_power(
        &self,
        entity_id: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send {
        (**self).set_power(entity_id, on)
    }
}

/// Handle on a live state-change subscription.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct StateSubscription {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl StateSubscription {
    /// Create a subscription and the sender the host notifies through.
    #[must_use]
    pub fn channel() -> (mpsc::UnboundedSender<String>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Wait for the next changed entity id; `None` once the host hangs up.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}
