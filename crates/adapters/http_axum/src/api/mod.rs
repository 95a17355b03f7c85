//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod schedules;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod states;
#[allow(clippy::missing_errors_doc)]
pub mod transfer;

use axum::Router;
use axum::routing::{get, post, put};

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, R, A, P, C>() -> Router<AppState<S, R, A, P, C>>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        // Schedules
        .route("/schedules", get(schedules::list::<S, R, A, P, C>))
        .route(
            "/schedules/{id}",
            get(schedules::get::<S, R, A, P, C>)
                .put(schedules::set::<S, R, A, P, C>)
                .delete(schedules::delete::<S, R, A, P, C>),
        )
        .route(
            "/schedules/{id}/enable",
            post(schedules::enable::<S, R, A, P, C>),
        )
        .route(
            "/schedules/{id}/disable",
            post(schedules::disable::<S, R, A, P, C>),
        )
        .route(
            "/schedules/{id}/conditions",
            put(schedules::set_conditions::<S, R, A, P, C>),
        )
        // Runtime state
        .route(
            "/schedules/{id}/state",
            get(states::get::<S, R, A, P, C>),
        )
        .route(
            "/schedules/{id}/preview",
            get(states::preview::<S, R, A, P, C>),
        )
        .route(
            "/schedules/{id}/reconcile",
            post(states::reconcile_one::<S, R, A, P, C>),
        )
        .route("/states", get(states::list::<S, R, A, P, C>))
        .route("/reconcile", post(states::reconcile_all::<S, R, A, P, C>))
        // Targets
        .route(
            "/targets/{entity_id}/schedules",
            get(transfer::for_target::<S, R, A, P, C>),
        )
        // Export / import
        .route("/export", get(transfer::export::<S, R, A, P, C>))
        .route("/import", post(transfer::import::<S, R, A, P, C>))
        // Observability
        .route("/events/stream", get(sse::stream::<S, R, A, P, C>))
}
