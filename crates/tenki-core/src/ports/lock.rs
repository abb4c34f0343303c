//! Lock service port: the host's short-lived mutual exclusion.

use async_trait::async_trait;
use std::time::Duration;

/// Short-lived mutual exclusion around the claim step.
///
/// Acquisition waits at most `timeout`; failure means another consumer is
/// active and is a signal to skip the pass, not an error.
#[async_trait]
pub trait LockService: Send + Sync {
    async fn try_acquire(&self, timeout: Duration) -> bool;

    async fn release(&self);
}
