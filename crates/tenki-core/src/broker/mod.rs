//! Deferred-job broker: queue semantics over cache, triggers and a lock.
//!
//! The host offers no task queue, only a key/value cache with expiry, a
//! one-shot clock-trigger scheduler and a short-lived lock. The broker
//! composes those three into enqueue / dequeue / consume with a defined
//! state machine and a sweeping policy, so a stateless, short-lived
//! request handler can behave like an asynchronous job system.

mod config;
mod expiry;

pub use config::BrokerConfig;

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{HandlerName, JobRecord, JobState, cache_key};
use crate::error::BrokerError;
use crate::ports::{CacheStore, Clock, LockService, TriggerHandle, TriggerScheduler};
use crate::registry::HandlerRegistry;

/// A job pulled out of the trigger listing by a dequeue scan.
#[derive(Debug, Clone)]
pub struct DequeuedJob {
    pub record: JobRecord,
    pub trigger: TriggerHandle,
}

/// Result of a dequeue scan.
#[derive(Debug, Clone)]
pub enum Dequeued {
    /// Claimable right now.
    Ready(DequeuedJob),

    /// Earliest future-scheduled candidate; visible but not claimable yet.
    Deferred(DequeuedJob),
}

/// What one consume pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// Another consumer holds the claim lock; skipped this pass.
    LockBusy,

    /// No job for this handler.
    Empty,

    /// Only future-scheduled work exists; nothing was claimed.
    Deferred,

    /// The job ran to completion.
    Completed,

    /// The job body returned an error; the record was left `failed`.
    Failed,
}

/// Emulates a task queue on the host's cache + trigger + lock primitives.
///
/// Design:
/// - The trigger listing is the queue; the cache holds per-job state; the
///   lock serializes only the claim step, never execution.
/// - Every dequeue walks the full listing, so useful-work discovery and
///   garbage collection happen in the same pass.
pub struct JobBroker {
    registry: Arc<HandlerRegistry>,
    cache: Arc<dyn CacheStore>,
    triggers: Arc<dyn TriggerScheduler>,
    lock: Arc<dyn LockService>,
    clock: Arc<dyn Clock>,
    config: BrokerConfig,
}

impl JobBroker {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        cache: Arc<dyn CacheStore>,
        triggers: Arc<dyn TriggerScheduler>,
        lock: Arc<dyn LockService>,
        clock: Arc<dyn Clock>,
        config: BrokerConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            triggers,
            lock,
            clock,
            config,
        }
    }

    /// Defer `payload` to `handler` via a fresh one-shot trigger.
    ///
    /// Side effects: one new trigger plus one `waiting` job record, created
    /// together. Fails when the name is not registered (re-invocation is by
    /// name) or when the trigger table is at capacity.
    pub async fn enqueue<P>(&self, handler: &HandlerName, payload: &P) -> Result<(), BrokerError>
    where
        P: Serialize + ?Sized,
    {
        self.enqueue_inner(handler, payload, None).await
    }

    /// Like [`JobBroker::enqueue`], but the job is not eligible to run
    /// before `scheduled_at` even though its trigger fires earlier.
    pub async fn enqueue_at<P>(
        &self,
        handler: &HandlerName,
        payload: &P,
        scheduled_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), BrokerError>
    where
        P: Serialize + ?Sized,
    {
        self.enqueue_inner(handler, payload, Some(scheduled_at)).await
    }

    async fn enqueue_inner<P>(
        &self,
        handler: &HandlerName,
        payload: &P,
        scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), BrokerError>
    where
        P: Serialize + ?Sized,
    {
        if !self.registry.contains(handler) {
            return Err(BrokerError::UnknownHandler(handler.clone()));
        }

        let active = self.triggers.list_clock_triggers().await.len();
        if active > self.config.max_slots {
            return Err(BrokerError::Busy {
                active,
                capacity: self.config.max_slots,
            });
        }

        let parameter = serde_json::to_string(payload)?;
        let id = self
            .triggers
            .create_after(self.config.enqueue_delay, handler)
            .await;

        let mut record = JobRecord::new(id, handler.clone(), parameter, self.clock.now());
        record.scheduled_at = scheduled_at;
        self.save(&record).await?;
        Ok(())
    }

    /// Scan the trigger listing for the oldest ready job of `handler`.
    ///
    /// The same pass sweeps as it goes: orphaned triggers (record expired
    /// from the cache or never written) are deleted, stale records are
    /// reconciled and removed together with their trigger. That is why the
    /// scan always walks the full listing instead of stopping at the first
    /// structural match.
    pub async fn dequeue(&self, handler: &HandlerName) -> Option<Dequeued> {
        let now = self.clock.now();
        let mut wait_job: Option<DequeuedJob> = None;

        for trigger in self.triggers.list_clock_triggers().await {
            let Some(record) = self.load(&trigger).await else {
                tracing::info!(id = %trigger.id, handler = %trigger.handler, "delete trigger");
                self.triggers.delete(trigger.id).await;
                continue;
            };

            if expiry::is_expired(&record, now, &self.config) {
                if record.state.is_terminal() {
                    tracing::info!(
                        id = %record.id,
                        handler = %record.handler,
                        state = ?record.state,
                        created_at = %record.created_at,
                        start_at = ?record.start_at,
                        end_at = ?record.end_at,
                        "job clear"
                    );
                } else {
                    tracing::info!(
                        id = %record.id,
                        handler = %record.handler,
                        state = ?record.state,
                        parameter = %record.parameter,
                        created_at = %record.created_at,
                        start_at = ?record.start_at,
                        "job time out"
                    );
                }
                self.triggers.delete(trigger.id).await;
                self.cache.remove(&record.cache_key()).await;
                continue;
            }

            if record.state != JobState::Waiting || record.handler != *handler {
                continue;
            }

            match record.scheduled_at {
                Some(scheduled_at) if scheduled_at > now => {
                    let earlier_than_best = wait_job
                        .as_ref()
                        .and_then(|best| best.record.scheduled_at)
                        .is_none_or(|best_at| scheduled_at < best_at);
                    if earlier_than_best {
                        wait_job = Some(DequeuedJob { record, trigger });
                    } else {
                        tracing::info!(
                            id = %record.id,
                            handler = %record.handler,
                            scheduled_at = %scheduled_at,
                            now = %now,
                            "job wait"
                        );
                    }
                }
                _ => return Some(Dequeued::Ready(DequeuedJob { record, trigger })),
            }
        }

        wait_job.map(Dequeued::Deferred)
    }

    /// One consumer pass: claim at most one ready job and run it.
    ///
    /// The lock covers only the claim (dequeue + transition to `starting`);
    /// it is released before the callback runs so long-running jobs never
    /// block other handlers' consume attempts. Errors raised by the job
    /// body are absorbed into the record's `failed` state and a log line,
    /// never propagated to the trigger scheduler.
    pub async fn consume_job(&self, handler: &HandlerName) -> Result<Consumed, BrokerError> {
        let job_handler = self
            .registry
            .get(handler)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownHandler(handler.clone()))?;

        if !self.lock.try_acquire(self.config.lock_wait).await {
            return Ok(Consumed::LockBusy);
        }

        let mut job = match self.dequeue(handler).await {
            Some(Dequeued::Ready(job)) => job,
            Some(Dequeued::Deferred(job)) => {
                self.lock.release().await;
                tracing::info!(
                    id = %job.record.id,
                    handler = %handler,
                    scheduled_at = ?job.record.scheduled_at,
                    "job wait"
                );
                return Ok(Consumed::Deferred);
            }
            None => {
                self.lock.release().await;
                tracing::info!(handler = %handler, "no active job");
                return Ok(Consumed::Empty);
            }
        };

        job.record.mark_starting(self.clock.now());
        let claimed = self.save(&job.record).await;
        self.lock.release().await;
        claimed?;

        tracing::info!(
            id = %job.record.id,
            created_at = %job.record.created_at,
            start_at = ?job.record.start_at,
            parameter = %job.record.parameter,
            "job starting"
        );

        let result = match serde_json::from_str::<serde_json::Value>(&job.record.parameter) {
            Ok(payload) => job_handler.run(payload).await,
            Err(err) => Err(BrokerError::Payload(err)),
        };

        match result {
            Ok(()) => {
                job.record.mark_end(self.clock.now());
                self.save(&job.record).await?;
                tracing::info!(
                    id = %job.record.id,
                    created_at = %job.record.created_at,
                    start_at = ?job.record.start_at,
                    end_at = ?job.record.end_at,
                    "job success"
                );
                Ok(Consumed::Completed)
            }
            Err(err) => {
                job.record.mark_failed(self.clock.now());
                self.save(&job.record).await?;
                tracing::warn!(
                    id = %job.record.id,
                    error = %err,
                    created_at = %job.record.created_at,
                    start_at = ?job.record.start_at,
                    end_at = ?job.record.end_at,
                    parameter = %job.record.parameter,
                    "job failed"
                );
                Ok(Consumed::Failed)
            }
        }
    }

    async fn save(&self, record: &JobRecord) -> Result<(), BrokerError> {
        let ttl = expiry::cache_ttl_seconds(record, self.clock.now(), &self.config);
        let value = serde_json::to_string(record)?;
        self.cache.put(&record.cache_key(), value, ttl).await;
        Ok(())
    }

    async fn load(&self, trigger: &TriggerHandle) -> Option<JobRecord> {
        let raw = self
            .cache
            .get(&cache_key(&trigger.handler, &trigger.id))
            .await?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(id = %trigger.id, error = %err, "broken job record");
                None
            }
        }
    }
}
