//! Job record: the persisted unit of work state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HandlerName, JobState, TriggerId};

/// Persisted state describing one deferred unit of work.
///
/// Design:
/// - Lives in the cache store as serialized JSON, keyed by the owning
///   trigger (see [`cache_key`]); record and trigger are created together
///   and deleted together.
/// - Never written concurrently without the lock service held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Id of the owning trigger; stable for the job's lifetime.
    pub id: TriggerId,

    pub state: JobState,

    /// Registered name of the callback the consumer resolves on re-invocation.
    pub handler: HandlerName,

    /// Payload, serialized to JSON text at enqueue time.
    pub parameter: String,

    pub created_at: DateTime<Utc>,

    /// If set, the job is not eligible to run before this time even when
    /// its trigger fires earlier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(
        id: TriggerId,
        handler: HandlerName,
        parameter: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            state: JobState::Waiting,
            handler,
            parameter,
            created_at,
            scheduled_at: None,
            start_at: None,
            end_at: None,
        }
    }

    /// Claim the job: only valid inside the lock-held dequeue step.
    pub fn mark_starting(&mut self, now: DateTime<Utc>) {
        self.state = JobState::Starting;
        self.start_at = Some(now);
    }

    pub fn mark_end(&mut self, now: DateTime<Utc>) {
        self.state = JobState::End;
        self.end_at = Some(now);
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.state = JobState::Failed;
        self.end_at = Some(now);
    }

    pub fn cache_key(&self) -> String {
        cache_key(&self.handler, &self.id)
    }
}

/// Cache key for a job record, derived from the owning trigger's identity
/// so that record and trigger can always be correlated and swept together.
pub fn cache_key(handler: &HandlerName, id: &TriggerId) -> String {
    format!("job_broker#{handler}#{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new(
            TriggerId::generate(),
            HandlerName::new("log_error"),
            "{\"message\":\"x\"}".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn new_record_starts_waiting() {
        let record = record();
        assert_eq!(record.state, JobState::Waiting);
        assert!(record.scheduled_at.is_none());
        assert!(record.start_at.is_none());
        assert!(record.end_at.is_none());
    }

    #[test]
    fn transitions_stamp_timestamps() {
        let mut record = record();
        let t0 = Utc::now();
        record.mark_starting(t0);
        assert_eq!(record.state, JobState::Starting);
        assert_eq!(record.start_at, Some(t0));

        let t1 = Utc::now();
        record.mark_end(t1);
        assert_eq!(record.state, JobState::End);
        assert_eq!(record.end_at, Some(t1));
    }

    #[test]
    fn failed_stamps_end_at() {
        let mut record = record();
        let t = Utc::now();
        record.mark_starting(t);
        record.mark_failed(t);
        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.end_at, Some(t));
    }

    #[test]
    fn cache_key_correlates_handler_and_trigger() {
        let record = record();
        let key = record.cache_key();
        assert!(key.contains("log_error"));
        assert!(key.contains(&record.id.to_string()));
        assert_eq!(key, cache_key(&record.handler, &record.id));
    }

    #[test]
    fn record_serde_round_trip_keeps_optionals() {
        let mut record = record();
        record.scheduled_at = Some(Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
        // unset timestamps stay out of the serialized form
        assert!(!json.contains("start_at"));
    }
}
