//! Trigger scheduler port: the host's one-shot delayed re-invocation.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{HandlerName, TriggerId};

/// Handle to a registered clock trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerHandle {
    pub id: TriggerId,
    pub handler: HandlerName,
}

/// The host's clock-based trigger scheduler.
///
/// A trigger re-invokes its named handler once after the delay, but stays
/// in the listing until deleted; the broker relies on that to sweep
/// finished or stuck jobs. Trigger kinds other than clock triggers never
/// appear in the listing.
#[async_trait]
pub trait TriggerScheduler: Send + Sync {
    /// Register a one-shot trigger that re-invokes `handler` after `delay`.
    async fn create_after(&self, delay: Duration, handler: &HandlerName) -> TriggerId;

    /// All currently registered clock triggers, in the host's listing order.
    async fn list_clock_triggers(&self) -> Vec<TriggerHandle>;

    /// Deleting an already-deleted trigger is a no-op.
    async fn delete(&self, id: TriggerId);
}
