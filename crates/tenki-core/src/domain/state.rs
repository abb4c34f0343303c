//! Job lifecycle state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a job record.
///
/// State transitions:
/// - Waiting -> Starting -> End
/// - Waiting -> Starting -> Failed
///
/// No transition leaves a terminal state, and there is no automatic retry:
/// a failed job stays inspectable in the cache but is never re-queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Enqueued, not yet claimed by a consumer.
    Waiting,

    /// Claimed under the lock; the callback is about to run or running.
    Starting,

    /// Callback returned normally.
    End,

    /// Callback raised an error.
    Failed,
}

impl JobState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::End | JobState::Failed)
    }
}
