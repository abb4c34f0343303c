//! In-memory stand-in for the host's delayed-trigger scheduler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{HandlerName, TriggerId};
use crate::ports::{Clock, TriggerHandle, TriggerScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    Clock,
    /// Some other trigger source; never surfaced in the clock listing.
    Foreign,
}

struct TriggerEntry {
    id: TriggerId,
    handler: HandlerName,
    kind: TriggerKind,
    fire_at: DateTime<Utc>,
    fired: bool,
}

/// Trigger scheduler holding its collection as explicit owned state.
///
/// Mirrors the host's behavior: a trigger fires its handler once after the
/// delay but stays in the listing until deleted, which is what makes the
/// broker's sweeping necessary in the first place. A host pump drains
/// newly-due triggers through [`InMemoryTriggerScheduler::take_due`].
pub struct InMemoryTriggerScheduler {
    clock: Arc<dyn Clock>,
    triggers: Mutex<Vec<TriggerEntry>>,
}

impl InMemoryTriggerScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            triggers: Mutex::new(Vec::new()),
        }
    }

    /// Register a trigger of a non-clock source kind. It occupies the
    /// host's trigger table but never shows up in the clock listing.
    pub async fn register_foreign(&self, handler: &HandlerName) -> TriggerId {
        let id = TriggerId::generate();
        self.triggers.lock().await.push(TriggerEntry {
            id,
            handler: handler.clone(),
            kind: TriggerKind::Foreign,
            fire_at: self.clock.now(),
            fired: true,
        });
        id
    }

    /// Clock triggers that have become due and have not fired yet; each is
    /// handed out exactly once. The trigger itself stays registered.
    pub async fn take_due(&self) -> Vec<TriggerHandle> {
        let now = self.clock.now();
        let mut triggers = self.triggers.lock().await;
        let mut due = Vec::new();
        for entry in triggers.iter_mut() {
            if entry.kind == TriggerKind::Clock && !entry.fired && entry.fire_at <= now {
                entry.fired = true;
                due.push(TriggerHandle {
                    id: entry.id,
                    handler: entry.handler.clone(),
                });
            }
        }
        due
    }
}

#[async_trait]
impl TriggerScheduler for InMemoryTriggerScheduler {
    async fn create_after(&self, delay: Duration, handler: &HandlerName) -> TriggerId {
        let id = TriggerId::generate();
        let fire_at = self.clock.now()
            + chrono::Duration::milliseconds(delay.as_millis() as i64);
        self.triggers.lock().await.push(TriggerEntry {
            id,
            handler: handler.clone(),
            kind: TriggerKind::Clock,
            fire_at,
            fired: false,
        });
        id
    }

    async fn list_clock_triggers(&self) -> Vec<TriggerHandle> {
        self.triggers
            .lock()
            .await
            .iter()
            .filter(|entry| entry.kind == TriggerKind::Clock)
            .map(|entry| TriggerHandle {
                id: entry.id,
                handler: entry.handler.clone(),
            })
            .collect()
    }

    async fn delete(&self, id: TriggerId) {
        self.triggers.lock().await.retain(|entry| entry.id != id);
    }
}
