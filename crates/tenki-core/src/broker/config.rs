//! Broker tunables.

use std::time::Duration;

/// Tunables for the job broker.
///
/// Defaults mirror the platform limits the broker is built against: a
/// small ceiling on outstanding triggers, a sub-second re-invocation
/// delay, a fifteen-minute claim timeout and a one-hour execution ceiling.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Capacity ceiling on registered triggers; enqueue past it is refused.
    pub max_slots: usize,

    /// Delay between enqueue and the trigger re-invoking the consumer.
    pub enqueue_delay: Duration,

    /// How long a job may sit `waiting`, or `starting` without progress,
    /// before the sweep treats it as timed out.
    pub starting_timeout: Duration,

    /// Upper bound on a running job's duration; sets the cache TTL of a
    /// `starting` record.
    pub execute_timeout: Duration,

    /// Bounded wait for the claim lock.
    pub lock_wait: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_slots: 10,
            enqueue_delay: Duration::from_millis(150),
            starting_timeout: Duration::from_secs(900),
            execute_timeout: Duration::from_secs(3600),
            lock_wait: Duration::from_millis(500),
        }
    }
}
