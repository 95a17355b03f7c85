//! JSON REST handlers for bulk access: per-target lookup, export and import.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use timer24h_domain::data::Timer24hData;
use timer24h_domain::schedule::Schedule;

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned by `POST /api/import`.
#[derive(Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

/// `GET /api/targets/:entity_id/schedules`: schedules driving an entity.
pub async fn for_target<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(entity_id): Path<String>,
) -> Json<Vec<Schedule>>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    Json(state.schedule_service.schedules_for_target(&entity_id).await)
}

/// `GET /api/export`: every schedule definition, keyed by id.
pub async fn export<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
) -> Json<Timer24hData>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    Json(state.schedule_service.export().await)
}

/// `POST /api/import`: replace every schedule with the posted set.
pub async fn import<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Json(data): Json<Timer24hData>,
) -> Result<Json<ImportSummary>, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let imported = state.schedule_service.import(data).await?;
    Ok(Json(ImportSummary { imported }))
}
