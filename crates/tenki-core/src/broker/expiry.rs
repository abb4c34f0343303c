//! Expiry policy: cache TTLs chosen at save time, and the staleness check
//! applied during the dequeue sweep.
//!
//! Two mechanisms cover the same ground on purpose. The cache is
//! best-effort: it may evict a record before its TTL, and a trigger may
//! fire before its record is observed. The staleness check keeps a trigger
//! from staying orphaned when the TTL bookkeeping and the cache disagree.

use chrono::{DateTime, TimeDelta, Utc};

use super::BrokerConfig;
use crate::domain::{JobRecord, JobState};

/// Cache TTL to write alongside a record, chosen per state.
///
/// `None` leaves the entry under the store's maximum retention, which is
/// why failed records remain inspectable longest. A completed record gets
/// TTL zero: there is nothing left to keep.
pub(crate) fn cache_ttl_seconds(
    record: &JobRecord,
    now: DateTime<Utc>,
    config: &BrokerConfig,
) -> Option<u64> {
    let starting_timeout = config.starting_timeout.as_secs();
    match record.state {
        JobState::Waiting => Some(match record.scheduled_at {
            Some(scheduled_at) => {
                let lead = round_secs(scheduled_at - now);
                (starting_timeout as i64 + lead).max(0) as u64
            }
            // +1 rounds the fixed enqueue delay up to a whole second
            None => starting_timeout + 1,
        }),
        JobState::Starting => Some(config.execute_timeout.as_secs()),
        JobState::End => Some(0),
        JobState::Failed => None,
    }
}

/// Staleness check, evaluated on every record the dequeue scan visits.
///
/// Independent of whether the cache entry has already vanished: `waiting`
/// and `starting` ages are measured from their own anchors, a completed
/// record is always stale, a failed one never is (it ages out through the
/// cache alone).
pub(crate) fn is_expired(record: &JobRecord, now: DateTime<Utc>, config: &BrokerConfig) -> bool {
    let starting_timeout = config.starting_timeout.as_secs() as i64;
    match record.state {
        JobState::Waiting => {
            let anchor = record.scheduled_at.unwrap_or(record.created_at);
            ceil_secs(now - anchor) >= starting_timeout
        }
        JobState::Starting => match record.start_at {
            Some(start_at) => ceil_secs(now - start_at) >= starting_timeout,
            // never properly claimed
            None => true,
        },
        JobState::End => true,
        JobState::Failed => false,
    }
}

fn round_secs(delta: TimeDelta) -> i64 {
    (delta.num_milliseconds() as f64 / 1000.0).round() as i64
}

fn ceil_secs(delta: TimeDelta) -> i64 {
    (delta.num_milliseconds() as f64 / 1000.0).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandlerName, TriggerId};
    use chrono::Duration;
    use rstest::rstest;

    fn record(state: JobState) -> JobRecord {
        let mut record = JobRecord::new(
            TriggerId::generate(),
            HandlerName::new("log_error"),
            "{}".to_string(),
            Utc::now(),
        );
        record.state = state;
        record
    }

    #[rstest]
    #[case::starting(JobState::Starting, Some(3600))]
    #[case::end(JobState::End, Some(0))]
    #[case::failed(JobState::Failed, None)]
    fn ttl_by_plain_state(#[case] state: JobState, #[case] expected: Option<u64>) {
        let config = BrokerConfig::default();
        let record = record(state);
        assert_eq!(cache_ttl_seconds(&record, record.created_at, &config), expected);
    }

    #[test]
    fn waiting_without_schedule_covers_the_enqueue_delay() {
        let config = BrokerConfig::default();
        let record = record(JobState::Waiting);
        assert_eq!(
            cache_ttl_seconds(&record, record.created_at, &config),
            Some(901)
        );
    }

    #[test]
    fn waiting_with_schedule_extends_ttl_by_the_lead_time() {
        let config = BrokerConfig::default();
        let mut record = record(JobState::Waiting);
        let now = record.created_at;
        record.scheduled_at = Some(now + Duration::seconds(120));
        assert_eq!(cache_ttl_seconds(&record, now, &config), Some(900 + 120));
    }

    #[test]
    fn waiting_with_passed_schedule_shrinks_ttl() {
        let config = BrokerConfig::default();
        let mut record = record(JobState::Waiting);
        let now = record.created_at;
        record.scheduled_at = Some(now - Duration::seconds(100));
        assert_eq!(cache_ttl_seconds(&record, now, &config), Some(800));
    }

    #[rstest]
    #[case::fresh_waiting(0, false)]
    #[case::almost(899, false)]
    #[case::at_timeout(900, true)]
    #[case::past_timeout(1000, true)]
    fn waiting_expires_against_created_at(#[case] age_secs: i64, #[case] expired: bool) {
        let config = BrokerConfig::default();
        let record = record(JobState::Waiting);
        let now = record.created_at + Duration::seconds(age_secs);
        assert_eq!(is_expired(&record, now, &config), expired);
    }

    #[test]
    fn waiting_expiry_anchors_on_scheduled_at_when_set() {
        let config = BrokerConfig::default();
        let mut record = record(JobState::Waiting);
        record.scheduled_at = Some(record.created_at + Duration::seconds(600));

        // old by created_at, young by scheduled_at
        let now = record.created_at + Duration::seconds(1000);
        assert!(!is_expired(&record, now, &config));

        let now = record.created_at + Duration::seconds(1500);
        assert!(is_expired(&record, now, &config));
    }

    #[test]
    fn starting_expires_from_start_at() {
        let config = BrokerConfig::default();
        let mut record = record(JobState::Starting);
        let started = record.created_at;
        record.start_at = Some(started);

        assert!(!is_expired(&record, started + Duration::seconds(899), &config));
        assert!(is_expired(&record, started + Duration::seconds(900), &config));
    }

    #[test]
    fn starting_without_start_at_is_always_stale() {
        let config = BrokerConfig::default();
        let record = record(JobState::Starting);
        assert!(is_expired(&record, record.created_at, &config));
    }

    #[rstest]
    #[case::end(JobState::End, true)]
    #[case::failed(JobState::Failed, false)]
    fn terminal_staleness(#[case] state: JobState, #[case] expired: bool) {
        let config = BrokerConfig::default();
        let record = record(state);
        assert_eq!(is_expired(&record, record.created_at, &config), expired);
    }
}
