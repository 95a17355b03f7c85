//! Event bus port: publish/subscribe for reconciliation events.

use std::future::Future;

use timer24h_domain::error::Timer24hError;
use timer24h_domain::event::ScheduleUpdated;

/// Publishes [`ScheduleUpdated`] events to interested observers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: ScheduleUpdated,
    ) -> impl Future<Output = Result<(), Timer24hError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: ScheduleUpdated,
    ) -> impl Future<Output = Result<(), Timer24hError>> + Send {
        (**self).publish(event)
    }
}
