//! JSON REST handlers for runtime state, preview and manual reconciliation.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use timer24h_app::services::schedule_service::{PreviewSlot, ScheduleStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the preview endpoint.
#[derive(Deserialize)]
pub struct PreviewQuery {
    pub hours: Option<u32>,
}

/// Body returned by `POST /api/reconcile`.
#[derive(Serialize)]
pub struct ReconcileSummary {
    pub reconciled: usize,
}

/// Possible responses from the single state endpoints.
pub enum StatusResponse {
    Ok(Json<ScheduleStatus>),
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the state list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ScheduleStatus>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the preview endpoint.
pub enum PreviewResponse {
    Ok(Json<Vec<PreviewSlot>>),
}

impl IntoResponse for PreviewResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/schedules/:id/state`
pub async fn get<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<StatusResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let status = state.schedule_service.get_state(&id).await?;
    Ok(StatusResponse::Ok(Json(status)))
}

/// `GET /api/states`
pub async fn list<S, R, A, P, C>(State(state): State<AppState<S, R, A, P, C>>) -> ListResponse
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.schedule_service.get_all_states().await))
}

/// `GET /api/schedules/:id/preview?hours=N`: raw slot pattern ahead.
pub async fn preview<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<PreviewResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let slots = state.schedule_service.preview(&id, query.hours).await?;
    Ok(PreviewResponse::Ok(Json(slots)))
}

/// `POST /api/schedules/:id/reconcile`: run one pass now and return the result.
pub async fn reconcile_one<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<StatusResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    state.schedule_service.reconcile(Some(&id)).await?;
    let status = state.schedule_service.get_state(&id).await?;
    Ok(StatusResponse::Ok(Json(status)))
}

/// `POST /api/reconcile`: run a pass for every schedule.
pub async fn reconcile_all<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
) -> Result<Json<ReconcileSummary>, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let reconciled = state.schedule_service.reconcile(None).await?;
    Ok(Json(ReconcileSummary { reconciled }))
}
