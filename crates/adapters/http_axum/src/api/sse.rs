//! Server-Sent Events (SSE) stream of schedule updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use timer24h_domain::event::SCHEDULE_UPDATED;

use crate::state::AppState;

/// `GET /api/events/stream`: SSE stream of `schedule_updated` events.
///
/// Subscribes to the event bus broadcast channel and sends JSON-encoded
/// events as SSE frames named `schedule_updated`. The stream continues
/// until the client disconnects or the event bus is closed.
pub async fn stream<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(update) => match serde_json::to_string(&update) {
            Ok(json) => Some(Ok(Event::default().event(SCHEDULE_UPDATED).data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize schedule update for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(
                skipped = n,
                "SSE subscriber lagged, some updates were dropped"
            );
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
