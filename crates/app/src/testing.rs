//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;

use timer24h_domain::data::Timer24hData;
use timer24h_domain::error::{ActuationError, Timer24hError};
use timer24h_domain::event::ScheduleUpdated;
use timer24h_domain::schedule::{Schedule, Slots};
use timer24h_domain::slot::SlotClock;
use timer24h_domain::time::Timestamp;

use crate::engine::ScheduleEngine;
use crate::ports::{
    Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry, StateSubscription,
};

/// Host with a state map, recorded power calls and live subscriptions.
#[derive(Default)]
pub struct FakeHost {
    states: Mutex<HashMap<String, String>>,
    subscribers: Mutex<Vec<(BTreeSet<String>, mpsc::UnboundedSender<String>)>>,
    calls: Mutex<Vec<(String, bool)>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeHost {
    pub fn with(states: &[(&str, &str)]) -> Arc<Self> {
        let host = Self::default();
        for (entity_id, state) in states {
            host.states
                .lock()
                .unwrap()
                .insert((*entity_id).to_string(), (*state).to_string());
        }
        Arc::new(host)
    }

    pub fn set_state(&self, entity_id: &str, state: &str) {
        self.states
            .lock()
            .unwrap()
            .insert(entity_id.to_string(), state.to_string());
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|(_, sender)| !sender.is_closed());
        for (entities, sender) in subscribers.iter() {
            if entities.contains(entity_id) {
                let _ = sender.send(entity_id.to_string());
            }
        }
    }

    pub fn fail_for(&self, entity_id: &str) {
        self.failing.lock().unwrap().insert(entity_id.to_string());
    }

    pub fn recover(&self, entity_id: &str) {
        self.failing.lock().unwrap().remove(entity_id);
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn live_subscriptions(&self) -> Vec<BTreeSet<String>> {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sender)| !sender.is_closed())
            .map(|(entities, _)| entities.clone())
            .collect()
    }
}

impl StateRegistry for FakeHost {
    fn get_state(&self, entity_id: &str) -> impl Future<Output = Option<String>> + Send {
        let state = self.states.lock().unwrap().get(entity_id).cloned();
        async { state }
    }

    fn subscribe(
        &self,
        entity_ids: &BTreeSet<String>,
    ) -> impl Future<Output = Result<StateSubscription, Timer24hError>> + Send {
        let (sender, subscription) = StateSubscription::channel();
        self.subscribers
            .lock()
            .unwrap()
            .push((entity_ids.clone(), sender));
        async { Ok(subscription) }
    }
}

impl Actuator for FakeHost {
    async fn set_power(&self, entity_id: &str, on: bool) -> Result<(), ActuationError> {
        tokio::task::yield_now().await;
        if self.failing.lock().unwrap().contains(entity_id) {
            return Err(ActuationError::Rejected {
                entity_id: entity_id.to_string(),
                reason: "unreachable".to_string(),
            });
        }
        self.calls.lock().unwrap().push((entity_id.to_string(), on));
        self.states.lock().unwrap().insert(
            entity_id.to_string(),
            if on { "on" } else { "off" }.to_string(),
        );
        Ok(())
    }
}

/// Actuator that hangs for `delay` on one entity and forwards to the host.
pub struct SlowActuator {
    host: Arc<FakeHost>,
    slow_entity: String,
    delay: Duration,
}

impl SlowActuator {
    pub fn new(host: &Arc<FakeHost>, slow_entity: &str, delay: Duration) -> Self {
        Self {
            host: Arc::clone(host),
            slow_entity: slow_entity.to_string(),
            delay,
        }
    }
}

impl Actuator for SlowActuator {
    async fn set_power(&self, entity_id: &str, on: bool) -> Result<(), ActuationError> {
        if entity_id == self.slow_entity {
            tokio::time::sleep(self.delay).await;
        }
        self.host.set_power(entity_id, on).await
    }
}

/// Clock frozen at a settable instant.
pub struct FixedClock(Mutex<Timestamp>);

impl FixedClock {
    pub fn at(hour: u32, minute: u32) -> Arc<Self> {
        Arc::new(Self(Mutex::new(at(hour, minute))))
    }

    pub fn set(&self, hour: u32, minute: u32) {
        *self.0.lock().unwrap() = at(hour, minute);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

/// 2026-03-14 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

/// Publisher recording every event.
#[derive(Default)]
pub struct SpyPublisher(Mutex<Vec<ScheduleUpdated>>);

impl SpyPublisher {
    pub fn events(&self) -> Vec<ScheduleUpdated> {
        self.0.lock().unwrap().clone()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(
        &self,
        event: ScheduleUpdated,
    ) -> impl Future<Output = Result<(), Timer24hError>> + Send {
        self.0.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

/// Store keeping the last saved data, optionally failing.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Timer24hData>,
    saves: Mutex<usize>,
    fail_load: Mutex<bool>,
    fail_save: Mutex<bool>,
}

impl MemoryStore {
    pub fn with(data: Timer24hData) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(data),
            ..Self::default()
        })
    }

    pub fn failing_load() -> Arc<Self> {
        let store = Self::default();
        *store.fail_load.lock().unwrap() = true;
        Arc::new(store)
    }

    pub fn fail_saves(&self) {
        *self.fail_save.lock().unwrap() = true;
    }

    pub fn saved(&self) -> Timer24hData {
        self.data.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl ScheduleStore for MemoryStore {
    fn load(&self) -> impl Future<Output = Result<Timer24hData, Timer24hError>> + Send {
        let result = if *self.fail_load.lock().unwrap() {
            Err(Timer24hError::Storage("disk on fire".into()))
        } else {
            Ok(self.data.lock().unwrap().clone())
        };
        async { result }
    }

    fn save(&self, data: &Timer24hData) -> impl Future<Output = Result<(), Timer24hError>> + Send {
        let result = if *self.fail_save.lock().unwrap() {
            Err(Timer24hError::Storage("read-only filesystem".into()))
        } else {
            *self.data.lock().unwrap() = data.clone();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        };
        async { result }
    }
}

pub type TestEngine = ScheduleEngine<Arc<FakeHost>, Arc<FakeHost>, Arc<SpyPublisher>, Arc<FixedClock>>;

pub fn engine(host: &Arc<FakeHost>, clock: &Arc<FixedClock>) -> (TestEngine, Arc<SpyPublisher>) {
    let publisher = Arc::new(SpyPublisher::default());
    let engine = ScheduleEngine::new(
        Arc::clone(host),
        Arc::clone(host),
        Arc::clone(&publisher),
        Arc::clone(clock),
        SlotClock::default(),
    );
    (engine, publisher)
}

/// Schedule active on slots 16..20 (08:00 to 10:00) driving `target`.
pub fn morning(id: &str, target: &str) -> Schedule {
    Schedule::builder()
        .schedule_id(id)
        .target_entity_id(target)
        .slots(Slots::active_range(16..20))
        .build()
        .unwrap()
}
