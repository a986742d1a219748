//! Clock / Timer Source
//!
//! All engine time flows through the [`Clock`] trait so tests can drive
//! logical time instead of sleeping. Offer expiry timers are futures on
//! `sleep_until`; the holder of the per-order lock cancels them through
//! `CancellationToken` handles, never by touching the clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

/// Monotonic time provider in Unix milliseconds
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Current time (Unix millis)
    fn now_millis(&self) -> i64;

    /// Complete at or after `deadline_millis`; returns immediately if the
    /// deadline already passed
    async fn sleep_until(&self, deadline_millis: i64);
}

// ============================================================================
// SystemClock
// ============================================================================

/// Production clock.
///
/// Anchors a wall-clock epoch to a `tokio::time::Instant` taken at
/// construction, so `now_millis` and `sleep_until` stay consistent with
/// each other - including under a paused tokio runtime in tests.
pub struct SystemClock {
    epoch_millis: i64,
    started: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch_millis: shared::util::now_millis(),
            started: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        self.epoch_millis + self.started.elapsed().as_millis() as i64
    }

    async fn sleep_until(&self, deadline_millis: i64) {
        let offset = deadline_millis - self.epoch_millis;
        if offset <= 0 {
            return;
        }
        let deadline = self.started + std::time::Duration::from_millis(offset as u64);
        tokio::time::sleep_until(deadline).await;
    }
}

// ============================================================================
// ManualClock
// ============================================================================

/// Test clock driven by explicit calls.
///
/// `advance` moves time forward and wakes sleepers whose deadline was
/// reached. `set_millis` moves time *without* waking anyone, which lets
/// tests observe the time-based expiry check before the timeout callback
/// has fired.
pub struct ManualClock {
    now: AtomicI64,
    tick: Notify,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start_millis),
            tick: Notify::new(),
        })
    }

    /// Move time forward and wake sleepers
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
        self.tick.notify_waiters();
    }

    /// Move time without waking sleepers (timers stay dormant)
    pub fn set_millis(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep_until(&self, deadline_millis: i64) {
        loop {
            // Register before the check so an advance between check and
            // await cannot be missed
            let notified = self.tick.notified();
            if self.now_millis() >= deadline_millis {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_advances_with_virtual_time() {
        let clock = SystemClock::new();
        let before = clock.now_millis();
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        assert_eq!(clock.now_millis() - before, 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_sleep_until_past_deadline_returns() {
        let clock = SystemClock::new();
        clock.sleep_until(clock.now_millis() - 10).await;
    }

    #[tokio::test]
    async fn test_manual_clock_advance_wakes_sleeper() {
        let clock = ManualClock::new(0);
        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep_until(1_000).await })
        };
        tokio::task::yield_now().await;
        clock.advance(1_000);
        sleeper.await.unwrap();
        assert_eq!(clock.now_millis(), 1_000);
    }

    #[tokio::test]
    async fn test_manual_clock_set_millis_leaves_sleeper_dormant() {
        let clock = ManualClock::new(0);
        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep_until(1_000).await })
        };
        tokio::task::yield_now().await;
        clock.set_millis(5_000);
        tokio::task::yield_now().await;
        assert!(!sleeper.is_finished());
        clock.advance(0);
        sleeper.await.unwrap();
    }
}
