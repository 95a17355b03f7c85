//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves API routes under `/api` and a liveness probe at `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<S, R, A, P, C>(state: AppState<S, R, A, P, C>) -> Router
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
