//! Slot ticker: wakes the engine at every half-hour slot boundary.
//!
//! Exactly one wake-up is outstanding at a time. When it fires, the next one
//! is armed before the reconciliation pass starts, so a slow pass delays
//! only itself.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::engine::ScheduleEngine;
use crate::ports::{Actuator, Clock, EventPublisher, StateRegistry};

/// Delay added past each boundary so the pass observes the new slot.
const BOUNDARY_GRACE: Duration = Duration::from_millis(500);

/// Background task driving [`ScheduleEngine::reconcile_all`] on slot boundaries.
pub struct SlotTicker {
    handle: JoinHandle<()>,
}

impl SlotTicker {
    /// Spawn the ticker on the current tokio runtime.
    pub fn spawn<R, A, P, C>(engine: ScheduleEngine<R, A, P, C>) -> Self
    where
        R: StateRegistry + Send + Sync + 'static,
        A: Actuator + Send + Sync + 'static,
        P: EventPublisher + Send + Sync + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut previous = None;
            loop {
                let now = engine.now();
                let from = previous.map_or(now, |boundary| now.max(boundary));
                let boundary = engine.next_wake(from);
                let wait = (boundary - engine.now()).to_std().unwrap_or_default();
                tracing::debug!(next_tick = %boundary, "armed next slot boundary");

                tokio::time::sleep(wait + BOUNDARY_GRACE).await;
                previous = Some(boundary);

                tracing::debug!(tick = %boundary, "slot boundary reached");
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.reconcile_all().await;
                });
            }
        });
        Self { handle }
    }

    /// Cancel the outstanding wake-up.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}
