//! Shared application state for axum handlers.

use std::sync::Arc;

use timer24h_app::event_bus::InProcessEventBus;
use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use timer24h_app::services::schedule_service::ScheduleService;

/// Application state shared across all axum handlers.
///
/// Generic over the store, host, publisher and clock types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<S, R, A, P, C> {
    /// Schedule commands and queries.
    pub schedule_service: Arc<ScheduleService<S, R, A, P, C>>,
    /// Bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<S, R, A, P, C> Clone for AppState<S, R, A, P, C> {
    fn clone(&self) -> Self {
        Self {
            schedule_service: Arc::clone(&self.schedule_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<S, R, A, P, C> AppState<S, R, A, P, C>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(
        schedule_service: ScheduleService<S, R, A, P, C>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self::from_arcs(Arc::new(schedule_service), event_bus)
    }

    /// Create a new application state from a pre-wrapped `Arc` service.
    ///
    /// Use this when the service is shared with background tasks or the
    /// shutdown path before constructing the HTTP state.
    pub fn from_arcs(
        schedule_service: Arc<ScheduleService<S, R, A, P, C>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            schedule_service,
            event_bus,
        }
    }
}
