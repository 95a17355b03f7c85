//! Wiring shared by the handler tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use timer24h_adapter_virtual::{VirtualEntity, VirtualHost};
use timer24h_app::engine::ScheduleEngine;
use timer24h_app::event_bus::InProcessEventBus;
use timer24h_app::ports::{Clock, ScheduleStore};
use timer24h_app::services::schedule_service::ScheduleService;
use timer24h_domain::data::Timer24hData;
use timer24h_domain::error::Timer24hError;
use timer24h_domain::slot::SlotClock;
use timer24h_domain::time::Timestamp;

use crate::state::AppState;

#[derive(Default)]
pub struct MemoryStore(Mutex<Timer24hData>);

impl ScheduleStore for MemoryStore {
    fn load(&self) -> impl Future<Output = Result<Timer24hData, Timer24hError>> + Send {
        let data = self.0.lock().unwrap().clone();
        async { Ok(data) }
    }

    fn save(&self, data: &Timer24hData) -> impl Future<Output = Result<(), Timer24hError>> + Send {
        *self.0.lock().unwrap() = data.clone();
        async { Ok(()) }
    }
}

/// 2026-03-14 08:10 UTC, inside slot 16.
pub struct MorningClock;

impl Clock for MorningClock {
    fn now(&self) -> Timestamp {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(8, 10, 0)
            .unwrap()
            .and_utc()
    }
}

pub type TestState =
    AppState<MemoryStore, Arc<VirtualHost>, Arc<VirtualHost>, Arc<InProcessEventBus>, MorningClock>;

pub fn test_state() -> (TestState, Arc<VirtualHost>) {
    let host = Arc::new(VirtualHost::new([
        VirtualEntity::new("switch.boiler", "off"),
        VirtualEntity::new("binary_sensor.window", "off"),
    ]));
    let event_bus = Arc::new(InProcessEventBus::new(64));
    let engine = ScheduleEngine::new(
        Arc::clone(&host),
        Arc::clone(&host),
        Arc::clone(&event_bus),
        MorningClock,
        SlotClock::default(),
    );
    let service = ScheduleService::new(MemoryStore::default(), engine);
    (AppState::new(service, event_bus), host)
}

pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Slots 16..20 (08:00 to 10:00) active.
pub fn morning_slots() -> Value {
    let slots: Vec<bool> = (0..48).map(|i| (16..20).contains(&i)).collect();
    serde_json::json!(slots)
}
