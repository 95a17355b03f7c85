//! Condition-change dispatcher: re-runs schedules when a watched entity changes.

use std::collections::BTreeSet;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::engine::ScheduleEngine;
use crate::ports::{Actuator, Clock, EventPublisher, StateRegistry};

/// Keeps exactly one host subscription covering every condition entity.
pub struct ConditionDispatcher<R, A, P, C> {
    engine: ScheduleEngine<R, A, P, C>,
    current: Mutex<Watch>,
}

#[derive(Default)]
struct Watch {
    entities: BTreeSet<String>,
    forwarder: Option<JoinHandle<()>>,
}

impl Watch {
    fn stop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

impl<R, A, P, C> ConditionDispatcher<R, A, P, C>
where
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    pub fn new(engine: ScheduleEngine<R, A, P, C>) -> Self {
        Self {
            engine,
            current: Mutex::new(Watch::default()),
        }
    }

    /// Entities currently watched.
    pub async fn watched(&self) -> BTreeSet<String> {
        self.current.lock().await.entities.clone()
    }

    /// Watch exactly `entities`.
    ///
    /// Nothing happens when the set is unchanged. Otherwise the previous
    /// subscription is torn down and, for a non-empty set, a new one is
    /// opened. Returns whether the subscription changed.
    pub async fn refresh(&self, entities: BTreeSet<String>) -> bool {
        let mut current = self.current.lock().await;
        if current.entities == entities {
            return false;
        }
        current.stop();
        current.entities.clear();

        if entities.is_empty() {
            tracing::debug!("no condition entities to watch");
            return true;
        }

        let mut subscription = match self.engine.registry().subscribe(&entities).await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(error = %err, "failed to subscribe to condition entities");
                return true;
            }
        };
        tracing::debug!(count = entities.len(), "watching condition entities");

        let engine = self.engine.clone();
        current.forwarder = Some(tokio::spawn(async move {
            while let Some(entity_id) = subscription.recv().await {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.reconcile_for_entity(&entity_id).await;
                });
            }
        }));
        current.entities = entities;
        true
    }

    /// Tear down the subscription.
    pub async fn shutdown(&self) {
        let mut current = self.current.lock().await;
        current.stop();
        current.entities.clear();
    }
}
