//! JSON REST handlers for schedule definitions.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use timer24h_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use timer24h_app::services::schedule_service::ScheduleSummary;
use timer24h_domain::schedule::{Condition, Schedule};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing a schedule.
#[derive(Deserialize)]
pub struct SetScheduleRequest {
    pub target_entity_id: String,
    pub slots: Vec<bool>,
    pub enabled: Option<bool>,
    pub timezone: Option<String>,
}

/// Request body for replacing a schedule's conditions.
#[derive(Deserialize)]
pub struct SetConditionsRequest {
    pub conditions: Vec<Condition>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ScheduleSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning one schedule.
pub enum ScheduleResponse {
    Ok(Json<Schedule>),
}

impl IntoResponse for ScheduleResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/schedules`: summaries of every schedule.
pub async fn list<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
) -> ListResponse
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.schedule_service.list_schedules().await))
}

/// `GET /api/schedules/:id`: one schedule definition.
pub async fn get<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<ScheduleResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let schedule = state.schedule_service.get_schedule(&id).await?;
    Ok(ScheduleResponse::Ok(Json(schedule)))
}

/// `PUT /api/schedules/:id`: create or replace a schedule.
pub async fn set<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
    Json(req): Json<SetScheduleRequest>,
) -> Result<ScheduleResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let schedule = state
        .schedule_service
        .set_schedule(
            &id,
            &req.target_entity_id,
            req.slots,
            req.enabled.unwrap_or(true),
            req.timezone,
        )
        .await?;
    Ok(ScheduleResponse::Ok(Json(schedule)))
}

/// `DELETE /api/schedules/:id`: delete a schedule.
pub async fn delete<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    state.schedule_service.remove(&id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/schedules/:id/enable`
pub async fn enable<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<ScheduleResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let schedule = state.schedule_service.enable(&id).await?;
    Ok(ScheduleResponse::Ok(Json(schedule)))
}

/// `POST /api/schedules/:id/disable`
pub async fn disable<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
) -> Result<ScheduleResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let schedule = state.schedule_service.disable(&id).await?;
    Ok(ScheduleResponse::Ok(Json(schedule)))
}

/// `PUT /api/schedules/:id/conditions`: replace the condition list.
pub async fn set_conditions<S, R, A, P, C>(
    State(state): State<AppState<S, R, A, P, C>>,
    Path(id): Path<String>,
    Json(req): Json<SetConditionsRequest>,
) -> Result<ScheduleResponse, ApiError>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let schedule = state
        .schedule_service
        .set_conditions(&id, req.conditions)
        .await?;
    Ok(ScheduleResponse::Ok(Json(schedule)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use timer24h_app::ports::StateRegistry;

    use crate::router::build;
    use crate::testing::{json_body, morning_slots, send, test_state};

    #[tokio::test]
    async fn should_create_schedule_and_switch_target_on() {
        let (state, host) = test_state();
        let app = build(state);

        let response = send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["schedule_id"], "morning");
        assert_eq!(body["enabled"], true);
        assert_eq!(body["conditions"], json!([]));
        assert_eq!(host.get_state("switch.boiler").await.as_deref(), Some("on"));
    }

    #[tokio::test]
    async fn should_reject_wrong_slot_count_with_bad_request() {
        let (state, _) = test_state();
        let app = build(state);

        let response = send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": [true, false] })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("48"));
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_schedule() {
        let (state, _) = test_state();
        let app = build(state);

        for (method, uri) in [
            ("GET", "/api/schedules/ghost"),
            ("DELETE", "/api/schedules/ghost"),
            ("POST", "/api/schedules/ghost/enable"),
            ("POST", "/api/schedules/ghost/disable"),
        ] {
            let response = send(&app, method, uri, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn should_list_summaries() {
        let (state, _) = test_state();
        let app = build(state);
        send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        let body = json_body(send(&app, "GET", "/api/schedules", None).await).await;

        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["schedule_id"], "morning");
        assert_eq!(body[0]["active_slots_count"], 4);
        assert_eq!(body[0]["conditions_count"], 0);
        assert_eq!(body[0]["desired_state"], true);
    }

    #[tokio::test]
    async fn should_switch_target_off_when_disabled() {
        let (state, host) = test_state();
        let app = build(state);
        send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        let response = send(&app, "POST", "/api/schedules/morning/disable", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["enabled"], false);
        assert_eq!(host.get_state("switch.boiler").await.as_deref(), Some("off"));
    }

    #[tokio::test]
    async fn should_force_target_off_when_condition_is_unmet() {
        let (state, host) = test_state();
        let app = build(state);
        send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        let response = send(
            &app,
            "PUT",
            "/api/schedules/morning/conditions",
            Some(json!({ "conditions": [
                { "entity_id": "binary_sensor.window", "expected": "on", "policy": "force_off" }
            ]})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["conditions"][0]["policy"], "force_off");
        assert_eq!(host.get_state("switch.boiler").await.as_deref(), Some("off"));
    }

    #[tokio::test]
    async fn should_default_condition_policy_to_skip() {
        let (state, _) = test_state();
        let app = build(state);
        send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        let body = json_body(
            send(
                &app,
                "PUT",
                "/api/schedules/morning/conditions",
                Some(json!({ "conditions": [{ "entity_id": "binary_sensor.window" }] })),
            )
            .await,
        )
        .await;

        assert_eq!(body["conditions"][0]["policy"], "skip");
        assert_eq!(body["conditions"][0]["expected"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn should_delete_schedule() {
        let (state, _) = test_state();
        let app = build(state);
        send(
            &app,
            "PUT",
            "/api/schedules/morning",
            Some(json!({ "target_entity_id": "switch.boiler", "slots": morning_slots() })),
        )
        .await;

        let response = send(&app, "DELETE", "/api/schedules/morning", None).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "GET", "/api/schedules/morning", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
