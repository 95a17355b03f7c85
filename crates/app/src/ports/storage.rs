//! Storage port: durable copy of every schedule definition.

use std::future::Future;

use timer24h_domain::data::Timer24hData;
use timer24h_domain::error::Timer24hError;

/// Loads and saves the whole schedule set.
///
/// The store owns the durable copy; the application keeps its own working
/// copy in memory and writes it back after every mutation.
pub trait ScheduleStore {
    /// Load every persisted schedule, keyed by id.
    fn load(&self) -> impl Future<Output = Result<Timer24hData, Timer24hError>> + Send;

    /// Replace the persisted schedules with `data`.
    fn save(&self, data: &Timer24hData) -> impl Future<Output = Result<(), Timer24hError>> + Send;
}

impl<T: ScheduleStore + Send + Sync> ScheduleStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Timer24hData, Timer24hError>> + Send {
        (**self).load()
    }

    fn save(&self, data: &Timer24hData) -> impl Future<Output = Result<(), Timer24hError>> + Send {
        (**self).save(data)
    }
}
