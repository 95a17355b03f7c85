//! Reconciliation engine: turns schedules into actuation calls.
//!
//! Every trigger (slot boundary, condition change, manual command) funnels
//! into [`ScheduleEngine::reconcile_schedule`]. A pass reads the current slot
//! and fresh condition states, derives a desired on/off value, and pushes it
//! to the target only when it differs from what was last applied there.
//!
//! Passes for the same schedule are serialized by a per-schedule lock, and
//! the compare-and-apply step is serialized per target entity, so schedules
//! sharing a target never lose an update. Unrelated schedules run
//! independently.
//!
//! Schedule definitions live next to those locks and are read without them:
//! picking the next wake-up or the schedules affected by an entity change
//! never waits on a pass that is stuck in an actuation call.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use timer24h_domain::error::{ActuationError, NotFoundError, Timer24hError};
use timer24h_domain::event::ScheduleUpdated;
use timer24h_domain::schedule::Schedule;
use timer24h_domain::slot::SlotClock;
use timer24h_domain::state::ScheduleState;
use timer24h_domain::time::Timestamp;

use crate::ports::{Actuator, Clock, EventPublisher, StateRegistry};

type Cell = Arc<Mutex<ScheduleState>>;

/// Latest definition of a schedule plus the lock guarding its runtime state.
struct Tracked {
    definition: Schedule,
    cell: Cell,
}

impl Tracked {
    fn new(schedule: Schedule) -> Self {
        Self {
            cell: Arc::new(Mutex::new(ScheduleState::new(schedule.clone()))),
            definition: schedule,
        }
    }
}

/// Shared handle on the reconciliation engine.
///
/// Cloning is cheap; all clones drive the same schedules.
pub struct ScheduleEngine<R, A, P, C> {
    inner: Arc<Inner<R, A, P, C>>,
}

struct Inner<R, A, P, C> {
    registry: R,
    actuator: A,
    publisher: P,
    clock: C,
    slot_clock: SlotClock,
    schedules: RwLock<HashMap<String, Tracked>>,
    /// Last value applied per target entity, shared by every schedule
    /// driving that entity.
    applied: std::sync::Mutex<HashMap<String, Arc<Mutex<Option<bool>>>>>,
}

impl<R, A, P, C> Clone for ScheduleEngine<R, A, P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, A, P, C> ScheduleEngine<R, A, P, C>
where
    R: StateRegistry + Send + Sync + 'static,
    A: Actuator + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create an engine with no registered schedule.
    pub fn new(registry: R, actuator: A, publisher: P, clock: C, slot_clock: SlotClock) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                actuator,
                publisher,
                clock,
                slot_clock,
                schedules: RwLock::new(HashMap::new()),
                applied: std::sync::Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.inner.registry
    }

    #[must_use]
    pub fn slot_clock(&self) -> SlotClock {
        self.inner.slot_clock
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    /// Track `schedule` with a fresh runtime state, replacing any previous one.
    pub fn register(&self, schedule: Schedule) {
        let id = schedule.schedule_id.clone();
        self.write_schedules().insert(id, Tracked::new(schedule));
    }

    /// Refresh the working copy of `schedule`, keeping its runtime state.
    ///
    /// Registers the schedule when it is not tracked yet. The runtime state
    /// picks the new definition up at the start of its next pass, so this
    /// never waits for a pass in progress.
    pub fn update(&self, schedule: Schedule) {
        let mut schedules = self.write_schedules();
        match schedules.get_mut(&schedule.schedule_id) {
            Some(tracked) => tracked.definition = schedule,
            None => {
                schedules.insert(schedule.schedule_id.clone(), Tracked::new(schedule));
            }
        }
    }

    /// Stop tracking a schedule. Returns whether it was tracked.
    ///
    /// The target is left as it is and its de-duplication record is kept.
    pub fn unregister(&self, schedule_id: &str) -> bool {
        self.write_schedules().remove(schedule_id).is_some()
    }

    /// Drop every tracked schedule and register `schedules` instead.
    pub fn replace_all(&self, schedules: impl IntoIterator<Item = Schedule>) {
        let fresh: HashMap<_, _> = schedules
            .into_iter()
            .map(|schedule| (schedule.schedule_id.clone(), Tracked::new(schedule)))
            .collect();
        *self.write_schedules() = fresh;
    }

    #[must_use]
    pub fn contains(&self, schedule_id: &str) -> bool {
        self.read_schedules().contains_key(schedule_id)
    }

    /// Ids of every tracked schedule, sorted.
    #[must_use]
    pub fn schedule_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.read_schedules().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Current definition of a schedule, read without waiting on its pass.
    #[must_use]
    pub fn definition(&self, schedule_id: &str) -> Option<Schedule> {
        self.read_schedules()
            .get(schedule_id)
            .map(|tracked| tracked.definition.clone())
    }

    /// Snapshot of one schedule's runtime state.
    ///
    /// Waits for a pass in progress on that schedule.
    pub async fn state(&self, schedule_id: &str) -> Option<ScheduleState> {
        let cell = self.cell(schedule_id)?;
        let mut state = cell.lock().await.clone();
        if let Some(definition) = self.definition(schedule_id) {
            state.schedule = definition;
        }
        Some(state)
    }

    /// Snapshots of every schedule's runtime state, sorted by schedule id.
    pub async fn states(&self) -> Vec<ScheduleState> {
        let mut states = Vec::new();
        for id in self.schedule_ids() {
            if let Some(state) = self.state(&id).await {
                states.push(state);
            }
        }
        states
    }

    /// Last value applied to `entity_id` by any schedule.
    pub async fn last_applied_for(&self, entity_id: &str) -> Option<bool> {
        let record = self
            .inner
            .applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()?;
        *record.lock().await
    }

    /// Earliest slot boundary after `after` across the default zone and every
    /// zone a tracked schedule runs in.
    #[must_use]
    pub fn next_wake(&self, after: Timestamp) -> Timestamp {
        let slot_clock = self.inner.slot_clock;
        let mut zones = Vec::new();
        for tracked in self.read_schedules().values() {
            let zone = slot_clock.zone(tracked.definition.timezone.as_deref());
            if !zones.contains(&zone) {
                zones.push(zone);
            }
        }
        slot_clock.earliest_boundary(after, zones)
    }

    /// Run one reconciliation pass for `schedule_id`.
    ///
    /// Actuation failures are logged and leave the recorded state untouched;
    /// the next trigger retries.
    ///
    /// # Errors
    ///
    /// Returns [`Timer24hError::NotFound`] when the schedule is not tracked.
    pub async fn reconcile_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<ScheduleState, Timer24hError> {
        let Some(cell) = self.cell(schedule_id) else {
            tracing::warn!(schedule_id, "cannot reconcile unknown schedule");
            return Err(NotFoundError::schedule(schedule_id).into());
        };
        let mut state = cell.lock().await;
        match self.definition(schedule_id) {
            Some(definition) => state.schedule = definition,
            None => {
                tracing::debug!(schedule_id, "schedule removed while waiting for its pass");
                return Err(NotFoundError::schedule(schedule_id).into());
            }
        }

        let decided = self.decide(&mut state).await;
        if decided {
            self.apply(&mut state).await;
        }

        let event = ScheduleUpdated {
            schedule_id: schedule_id.to_string(),
            desired_state: state.desired_state,
            last_condition_evaluation: state.last_condition_evaluation.clone(),
            timestamp: self.now(),
        };
        if let Err(err) = self.inner.publisher.publish(event).await {
            tracing::warn!(schedule_id, error = %err, "failed to publish schedule update");
        }

        Ok(state.clone())
    }

    /// Reconcile every tracked schedule concurrently.
    ///
    /// A failing or panicking pass does not affect the others. Returns the
    /// number of passes that completed.
    pub async fn reconcile_all(&self) -> usize {
        tracing::debug!("reconciling all schedules");
        self.reconcile_many(self.schedule_ids()).await
    }

    /// Reconcile every schedule with a condition on `entity_id`, once each.
    pub async fn reconcile_for_entity(&self, entity_id: &str) -> usize {
        let affected: Vec<_> = self
            .read_schedules()
            .values()
            .filter(|tracked| tracked.definition.references(entity_id))
            .map(|tracked| tracked.definition.schedule_id.clone())
            .collect();
        tracing::debug!(entity_id, schedules = affected.len(), "condition entity changed");
        self.reconcile_many(affected).await
    }

    async fn reconcile_many(&self, ids: Vec<String>) -> usize {
        let mut tasks = JoinSet::new();
        for id in ids {
            let engine = self.clone();
            tasks.spawn(async move {
                let result = engine.reconcile_schedule(&id).await;
                (id, result)
            });
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => completed += 1,
                Ok((id, Err(err))) => {
                    tracing::warn!(schedule_id = %id, error = %err, "reconciliation failed");
                }
                Err(err) => tracing::error!(error = %err, "reconciliation task aborted"),
            }
        }
        completed
    }

    /// Compute the desired state. Returns `false` when skip/defer withholds
    /// any action, in which case `desired_state` keeps its previous value.
    async fn decide(&self, state: &mut ScheduleState) -> bool {
        let schedule = &state.schedule;
        if !schedule.enabled {
            state.desired_state = Some(false);
            state.last_condition_evaluation = Some("Schedule disabled".to_string());
            return true;
        }

        let slot_clock = self.inner.slot_clock;
        let zone = slot_clock.zone(schedule.timezone.as_deref());
        let slot = slot_clock.current_slot(self.now(), zone);
        if !schedule.slots.is_active(slot) {
            state.desired_state = Some(false);
            state.last_condition_evaluation = Some(format!("Slot {slot} inactive"));
            return true;
        }

        let mut observed = HashMap::new();
        for entity_id in schedule.condition_entities() {
            if let Some(value) = self.inner.registry.get_state(&entity_id).await {
                observed.insert(entity_id, value);
            }
        }
        let evaluation = schedule.evaluate_conditions(&observed);
        state.last_condition_evaluation = Some(evaluation.reason);
        match evaluation.decision {
            Some(desired) => {
                state.desired_state = Some(desired);
                true
            }
            None => {
                tracing::debug!(
                    schedule_id = %state.schedule.schedule_id,
                    reason = state.last_condition_evaluation.as_deref(),
                    "no action this pass"
                );
                false
            }
        }
    }

    async fn apply(&self, state: &mut ScheduleState) {
        let Some(desired) = state.desired_state else {
            return;
        };
        let schedule_id = state.schedule.schedule_id.clone();
        let target = state.schedule.target_entity_id.clone();

        let record = self.applied_record(&target);
        let mut last_applied = record.lock().await;
        if *last_applied == Some(desired) {
            tracing::debug!(%schedule_id, target_entity_id = %target, desired, "already applied");
            return;
        }

        match self.inner.actuator.set_power(&target, desired).await {
            Ok(()) => {
                *last_applied = Some(desired);
                state.last_applied_state = Some(desired);
                tracing::info!(
                    %schedule_id,
                    target_entity_id = %target,
                    desired,
                    "turned {}",
                    if desired { "on" } else { "off" }
                );
            }
            Err(ActuationError::UnknownEntity(_)) => {
                tracing::warn!(%schedule_id, target_entity_id = %target, "target entity not found");
            }
            Err(err) => {
                tracing::error!(
                    %schedule_id,
                    target_entity_id = %target,
                    error = %err,
                    "failed to control target"
                );
            }
        }
    }

    fn cell(&self, schedule_id: &str) -> Option<Cell> {
        self.read_schedules()
            .get(schedule_id)
            .map(|tracked| Arc::clone(&tracked.cell))
    }

    fn applied_record(&self, entity_id: &str) -> Arc<Mutex<Option<bool>>> {
        let mut applied = self
            .inner
            .applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(applied.entry(entity_id.to_string()).or_default())
    }

    fn read_schedules(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Tracked>> {
        self.inner
            .schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_schedules(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Tracked>> {
        self.inner
            .schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
