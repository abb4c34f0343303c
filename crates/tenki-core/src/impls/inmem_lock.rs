//! In-memory mutual exclusion with bounded-wait acquire.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::ports::LockService;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Non-reentrant flag lock.
///
/// `try_acquire` polls until the deadline instead of parking, matching the
/// host lock's bounded-wait contract: no caller ever blocks indefinitely.
#[derive(Default)]
pub struct InMemoryLock {
    held: Mutex<bool>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockService for InMemoryLock {
    async fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut held = self.held.lock().await;
                if !*held {
                    *held = true;
                    return true;
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn release(&self) {
        *self.held.lock().await = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn acquire_then_contend_then_release() {
        let lock = Arc::new(InMemoryLock::new());
        assert!(lock.try_acquire(Duration::ZERO).await);

        // held elsewhere: bounded wait runs out
        assert!(!lock.try_acquire(Duration::from_millis(30)).await);

        lock.release().await;
        assert!(lock.try_acquire(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn waiter_gets_the_lock_once_released() {
        let lock = Arc::new(InMemoryLock::new());
        assert!(lock.try_acquire(Duration::ZERO).await);

        let waiter = {
            let lock = Arc::clone(&lock);
            tokio::spawn(async move { lock.try_acquire(Duration::from_millis(500)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        lock.release().await;

        assert!(waiter.await.unwrap());
    }
}
