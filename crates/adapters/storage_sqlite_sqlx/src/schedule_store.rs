//! `SQLite` implementation of [`ScheduleStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use timer24h_app::ports::ScheduleStore;
use timer24h_domain::data::Timer24hData;
use timer24h_domain::error::Timer24hError;
use timer24h_domain::schedule::{Condition, Schedule, Slots};

use crate::error::StorageError;

struct Wrapper(Schedule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let schedule_id: String = row.try_get("schedule_id")?;
        let target_entity_id: String = row.try_get("target_entity_id")?;
        let slots_json: Option<String> = row.try_get("slots")?;
        let enabled: bool = row.try_get("enabled")?;
        let timezone: Option<String> = row.try_get("timezone")?;
        let conditions_json: String = row.try_get("conditions")?;

        let slots: Slots = slots_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .unwrap_or_default();
        let conditions: Vec<Condition> = serde_json::from_str(&conditions_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Schedule {
            schedule_id,
            target_entity_id,
            slots,
            enabled,
            timezone,
            conditions,
        }))
    }
}

/// `SQLite`-backed schedule store.
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteScheduleStore {
    async fn load(&self) -> Result<Timer24hData, Timer24hError> {
        let rows = sqlx::query("SELECT * FROM schedules ORDER BY schedule_id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut data = Timer24hData::default();
        for row in &rows {
            let schedule = match Wrapper::from_row(row) {
                Ok(Wrapper(schedule)) => schedule,
                Err(err) => {
                    let schedule_id: Option<String> = row.try_get("schedule_id").ok();
                    tracing::error!(?schedule_id, error = %err, "skipping undecodable schedule row");
                    continue;
                }
            };
            if let Err(err) = schedule.validate() {
                tracing::error!(schedule_id = %schedule.schedule_id, error = %err, "skipping invalid schedule row");
                continue;
            }
            data.upsert(schedule);
        }
        tracing::debug!(schedules = data.len(), "schedules loaded");
        Ok(data)
    }

    async fn save(&self, data: &Timer24hData) -> Result<(), Timer24hError> {
        let mut schedules: Vec<&Schedule> = data.schedules.values().collect();
        schedules.sort_by(|a, b| a.schedule_id.cmp(&b.schedule_id));

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query("DELETE FROM schedules")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        for schedule in schedules {
            let slots_json = serde_json::to_string(&schedule.slots).map_err(StorageError::from)?;
            let conditions_json =
                serde_json::to_string(&schedule.conditions).map_err(StorageError::from)?;

            sqlx::query(
                "INSERT INTO schedules (schedule_id, target_entity_id, slots, enabled, timezone, conditions) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&schedule.schedule_id)
            .bind(&schedule.target_entity_id)
            .bind(&slots_json)
            .bind(schedule.enabled)
            .bind(&schedule.timezone)
            .bind(&conditions_json)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        }

        tx.commit().await.map_err(StorageError::from)?;
        tracing::debug!(schedules = data.len(), "schedules saved");
        Ok(())
    }
}
