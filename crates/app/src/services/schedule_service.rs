//! Schedule service: the command/query surface over the scheduler.
//!
//! Commands mutate the in-memory [`Timer24hData`], persist it, refresh the
//! engine's working copy and the dispatcher's subscription, then reconcile
//! the affected schedule. Persistence failures never fail a command: the
//! in-memory data stays the source of truth until the next successful save.

use std::collections::BTreeSet;
use std::sync::PoisonError;

use chrono::{TimeDelta, Timelike};
use serde::Serialize;
use tokio::sync::Mutex;

use timer24h_domain::data::Timer24hData;
use timer24h_domain::error::{NotFoundError, Timer24hError, ValidationError};
use timer24h_domain::schedule::{Condition, Schedule, Slots};
use timer24h_domain::slot::{MINUTES_PER_SLOT, current_slot_index};
use timer24h_domain::state::ScheduleState;
use timer24h_domain::time::Timestamp;

use crate::dispatcher::ConditionDispatcher;
use crate::engine::ScheduleEngine;
use crate::ports::{Actuator, Clock, EventPublisher, ScheduleStore, StateRegistry};
use crate::slot_ticker::SlotTicker;

/// Preview horizon used when the caller does not give one.
pub const DEFAULT_PREVIEW_HOURS: u32 = 24;

/// Longest accepted preview horizon (one week).
pub const MAX_PREVIEW_HOURS: u32 = 168;

/// One line of [`ScheduleService::list_schedules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub schedule_id: String,
    pub target_entity_id: String,
    pub enabled: bool,
    pub timezone: Option<String>,
    pub conditions_count: usize,
    pub active_slots_count: usize,
    pub desired_state: Option<bool>,
    pub last_applied_state: Option<bool>,
    pub last_condition_evaluation: Option<String>,
}

/// Runtime state of a schedule together with where it stands in its day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleStatus {
    #[serde(flatten)]
    pub state: ScheduleState,
    pub current_slot: usize,
    pub next_slot_time: Timestamp,
}

/// One upcoming slot of [`ScheduleService::preview`].
///
/// `hour` and `minute` are local to the schedule's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSlot {
    pub slot_index: usize,
    pub time: Timestamp,
    pub hour: u32,
    pub minute: u32,
    pub active: bool,
}

/// Application service owning schedules, engine, dispatcher and ticker.
pub struct ScheduleService<S, R, A, P, C> {
    store: S,
    engine: ScheduleEngine<R, A, P, C>,
    dispatcher: ConditionDispatcher<R, A, P, C>,
    data: Mutex<Timer24hData>,
    ticker: std::sync::Mutex<Option<SlotTicker>>,
}

impl<S, R, A, P, C> ScheduleService<S, R, A, P, C>
where
    S: ScheduleStore + Send + Sync + 'static,
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create a service backed by `store` and driving `engine`.
    pub fn new(store: S, engine: ScheduleEngine<R, A, P, C>) -> Self {
        let dispatcher = ConditionDispatcher::new(engine.clone());
        Self {
            store,
            engine,
            dispatcher,
            data: Mutex::new(Timer24hData::default()),
            ticker: std::sync::Mutex::new(None),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ScheduleEngine<R, A, P, C> {
        &self.engine
    }

    /// Load persisted schedules, start watching conditions and slot
    /// boundaries, and reconcile everything once.
    ///
    /// A load failure degrades to an empty schedule set. Returns the number
    /// of schedules loaded.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> usize {
        let loaded = match self.store.load().await {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::error!(error = %err, "failed to load schedules, starting empty");
                Timer24hData::default()
            }
        };
        let loaded: Timer24hData = loaded
            .schedules
            .into_iter()
            .filter_map(|(key, schedule)| {
                if key != schedule.schedule_id {
                    tracing::error!(%key, schedule_id = %schedule.schedule_id, "skipping schedule stored under a foreign key");
                    return None;
                }
                match schedule.validate() {
                    Ok(()) => Some(schedule),
                    Err(err) => {
                        tracing::error!(%key, error = %err, "skipping invalid schedule");
                        None
                    }
                }
            })
            .collect();
        let count = loaded.len();

        let mut data = self.data.lock().await;
        *data = loaded;
        self.engine.replace_all(data.schedules.values().cloned());
        self.dispatcher.refresh(data.condition_entities()).await;
        drop(data);

        self.engine.reconcile_all().await;

        let ticker = SlotTicker::spawn(self.engine.clone());
        if let Some(previous) = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ticker)
        {
            previous.shutdown();
        }

        tracing::info!(schedules = count, "scheduler started");
        count
    }

    /// Cancel the slot ticker and drop the condition subscription.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        let ticker = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.shutdown();
        }
        self.dispatcher.shutdown().await;
        tracing::info!("scheduler stopped");
    }

    // -- commands -----------------------------------------------------------

    /// Create or fully replace a schedule.
    ///
    /// The new schedule starts without conditions and with a fresh runtime
    /// state; entities only watched for the replaced conditions are dropped
    /// from the subscription.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] when `slots` does not hold
    /// exactly 48 entries, an id is empty, or the timezone is unknown.
    #[tracing::instrument(skip(self, slots))]
    pub async fn set_schedule(
        &self,
        schedule_id: &str,
        target_entity_id: &str,
        slots: Vec<bool>,
        enabled: bool,
        timezone: Option<String>,
    ) -> Result<Schedule, Timer24hError> {
        let slots = Slots::try_from(slots)?;
        let schedule = Schedule::builder()
            .schedule_id(schedule_id)
            .target_entity_id(target_entity_id)
            .slots(slots)
            .enabled(enabled)
            .timezone(timezone)
            .build()?;

        let mut data = self.data.lock().await;

        data.upsert(schedule.clone());
        self.persist(&data).await;
        self.engine.register(schedule.clone());
        self.dispatcher.refresh(data.condition_entities()).await;
        drop(data);

        self.reconcile_one(schedule_id).await;
        tracing::info!("schedule set");
        Ok(schedule)
    }

    /// Enable a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn enable(&self, schedule_id: &str) -> Result<Schedule, Timer24hError> {
        self.modify(schedule_id, |schedule| {
            schedule.enabled = true;
            Ok(())
        })
        .await
    }

    /// Disable a schedule; its target is switched off on the next pass.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn disable(&self, schedule_id: &str) -> Result<Schedule, Timer24hError> {
        self.modify(schedule_id, |schedule| {
            schedule.enabled = false;
            Ok(())
        })
        .await
    }

    /// Replace a schedule's conditions.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist
    /// and [`Timer24hError::Validation`] when a condition is invalid.
    #[tracing::instrument(skip(self, conditions), fields(conditions = conditions.len()))]
    pub async fn set_conditions(
        &self,
        schedule_id: &str,
        conditions: Vec<Condition>,
    ) -> Result<Schedule, Timer24hError> {
        for condition in &conditions {
            condition.validate()?;
        }
        self.modify(schedule_id, move |schedule| {
            schedule.conditions = conditions;
            Ok(())
        })
        .await
    }

    /// Delete a schedule. Its target is left in its current state.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, schedule_id: &str) -> Result<(), Timer24hError> {
        let mut data = self.data.lock().await;
        if !data.remove(schedule_id) {
            return Err(NotFoundError::schedule(schedule_id).into());
        }
        self.persist(&data).await;
        self.engine.unregister(schedule_id);
        self.dispatcher.refresh(data.condition_entities()).await;
        tracing::info!("schedule removed");
        Ok(())
    }

    /// Reconcile one schedule, or all of them when `schedule_id` is `None`.
    ///
    /// Returns the number of passes that completed.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the given schedule does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, schedule_id: Option<&str>) -> Result<usize, Timer24hError> {
        match schedule_id {
            Some(id) => self.engine.reconcile_schedule(id).await.map(|_| 1),
            None => Ok(self.engine.reconcile_all().await),
        }
    }

    /// Replace every schedule with `imported`.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] when any imported schedule is
    /// invalid; nothing changes in that case.
    #[tracing::instrument(skip(self, imported), fields(schedules = imported.len()))]
    pub async fn import(&self, imported: Timer24hData) -> Result<usize, Timer24hError> {
        imported.validate()?;
        let count = imported.len();

        let mut data = self.data.lock().await;
        *data = imported;
        self.persist(&data).await;
        self.engine.replace_all(data.schedules.values().cloned());
        self.dispatcher.refresh(data.condition_entities()).await;
        drop(data);

        self.engine.reconcile_all().await;
        tracing::info!(schedules = count, "schedules imported");
        Ok(count)
    }

    // -- queries ------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist.
    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Schedule, Timer24hError> {
        self.data
            .lock()
            .await
            .get(schedule_id)
            .cloned()
            .ok_or_else(|| NotFoundError::schedule(schedule_id).into())
    }

    /// Summaries of every schedule, sorted by id.
    pub async fn list_schedules(&self) -> Vec<ScheduleSummary> {
        self.engine
            .states()
            .await
            .into_iter()
            .map(|state| ScheduleSummary {
                schedule_id: state.schedule.schedule_id.clone(),
                target_entity_id: state.schedule.target_entity_id.clone(),
                enabled: state.schedule.enabled,
                timezone: state.schedule.timezone.clone(),
                conditions_count: state.schedule.conditions.len(),
                active_slots_count: state.schedule.slots.active_count(),
                desired_state: state.desired_state,
                last_applied_state: state.last_applied_state,
                last_condition_evaluation: state.last_condition_evaluation,
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule does not exist.
    pub async fn get_state(&self, schedule_id: &str) -> Result<ScheduleStatus, Timer24hError> {
        let state = self
            .engine
            .state(schedule_id)
            .await
            .ok_or_else(|| NotFoundError::schedule(schedule_id))?;
        Ok(self.status(state))
    }

    /// Status of every schedule, sorted by id.
    pub async fn get_all_states(&self) -> Vec<ScheduleStatus> {
        self.engine
            .states()
            .await
            .into_iter()
            .map(|state| self.status(state))
            .collect()
    }

    /// Raw slot pattern for the next `hours` hours, starting at the current slot.
    ///
    /// Conditions are not taken into account; a disabled schedule previews
    /// as inactive everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::Validation`] when `hours` is outside
    /// `1..=168` and [`Timer24hError::NotFound`] when the schedule does not exist.
    pub async fn preview(
        &self,
        schedule_id: &str,
        hours: Option<u32>,
    ) -> Result<Vec<PreviewSlot>, Timer24hError> {
        let hours = hours.unwrap_or(DEFAULT_PREVIEW_HOURS);
        if !(1..=MAX_PREVIEW_HOURS).contains(&hours) {
            return Err(ValidationError::PreviewHours(hours).into());
        }
        let schedule = self.get_schedule(schedule_id).await?;

        let slot_clock = self.engine.slot_clock();
        let zone = slot_clock.zone(schedule.timezone.as_deref());
        let start = slot_clock.slot_start(self.engine.now(), zone);
        let slot_length = TimeDelta::minutes(i64::from(MINUTES_PER_SLOT));

        Ok((0..hours * 2)
            .map(|offset| {
                let time = start + slot_length * i32::try_from(offset).unwrap_or(i32::MAX);
                let local = time.with_timezone(&zone);
                let slot_index = current_slot_index(&local);
                PreviewSlot {
                    slot_index,
                    time,
                    hour: local.hour(),
                    minute: local.minute(),
                    active: schedule.is_active_at_slot(i64::try_from(slot_index).unwrap_or(-1)),
                }
            })
            .collect())
    }

    /// Every schedule driving `entity_id`, sorted by id.
    pub async fn schedules_for_target(&self, entity_id: &str) -> Vec<Schedule> {
        self.data
            .lock()
            .await
            .schedules_for_target(entity_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Entities currently referenced by any condition.
    pub async fn condition_entities(&self) -> BTreeSet<String> {
        self.data.lock().await.condition_entities()
    }

    /// Copy of every schedule definition.
    pub async fn export(&self) -> Timer24hData {
        self.data.lock().await.clone()
    }

    // -- helpers ------------------------------------------------------------

    async fn modify<F>(&self, schedule_id: &str, change: F) -> Result<Schedule, Timer24hError>
    where
        F: FnOnce(&mut Schedule) -> Result<(), Timer24hError>,
    {
        let mut data = self.data.lock().await;
        let Some(existing) = data.get(schedule_id) else {
            return Err(NotFoundError::schedule(schedule_id).into());
        };
        let mut schedule = existing.clone();
        change(&mut schedule)?;
        schedule.validate()?;

        data.upsert(schedule.clone());
        self.persist(&data).await;
        self.engine.update(schedule.clone());
        self.dispatcher.refresh(data.condition_entities()).await;
        drop(data);

        self.reconcile_one(schedule_id).await;
        Ok(schedule)
    }

    async fn persist(&self, data: &Timer24hData) {
        if let Err(err) = self.store.save(data).await {
            tracing::error!(error = %err, "failed to save schedules, keeping them in memory");
        }
    }

    async fn reconcile_one(&self, schedule_id: &str) {
        if let Err(err) = self.engine.reconcile_schedule(schedule_id).await {
            tracing::warn!(schedule_id, error = %err, "reconciliation failed");
        }
    }

    fn status(&self, state: ScheduleState) -> ScheduleStatus {
        let slot_clock = self.engine.slot_clock();
        let zone = slot_clock.zone(state.schedule.timezone.as_deref());
        let now = self.engine.now();
        ScheduleStatus {
            current_slot: slot_clock.current_slot(now, zone),
            next_slot_time: slot_clock.next_boundary(now, zone),
            state,
        }
    }
}
