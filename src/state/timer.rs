//! Cancellable countdown slot owned one-per-session.
//!
//! A session has at most one live countdown (question timer or inter-question
//! countdown). The slot enforces that invariant itself: arming a new countdown
//! synchronously cancels whatever was running before, and a countdown that
//! fires can only take effect while its epoch still matches the slot.

use tokio::task::AbortHandle;

/// Tracks the session's single countdown task.
///
/// Every arm or cancel bumps the epoch. The spawned task carries the epoch it
/// was armed with and must check it (under the session lock) before ticking or
/// running its terminal action, so a stale task that survived an abort race
/// becomes a no-op instead of double-firing.
#[derive(Debug, Default)]
pub struct Countdown {
    epoch: u64,
    task: Option<AbortHandle>,
}

impl Countdown {
    /// Cancel the active countdown, if any. Idempotent.
    pub fn cancel(&mut self) {
        self.epoch += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Cancel the previous countdown and reserve the slot for a new one.
    ///
    /// Returns the epoch the new task must carry.
    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.epoch
    }

    /// Attach the spawned task's abort handle to a previously armed slot.
    ///
    /// Ignored if the slot was re-armed or canceled in the meantime.
    pub fn attach(&mut self, epoch: u64, task: AbortHandle) {
        if epoch == self.epoch {
            self.task = Some(task);
        }
    }

    /// Whether `epoch` still refers to the active countdown.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Consume the slot on natural expiry.
    ///
    /// Returns `true` exactly once per armed countdown; the caller may then
    /// run the terminal action. Returns `false` if the countdown was canceled
    /// or replaced since `epoch` was issued.
    pub fn expire(&mut self, epoch: u64) -> bool {
        if epoch == self.epoch {
            self.task = None;
            self.epoch += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_invalidates_previous_epoch() {
        let mut countdown = Countdown::default();
        let first = countdown.arm();
        let second = countdown.arm();
        assert_ne!(first, second);
        assert!(!countdown.is_current(first));
        assert!(countdown.is_current(second));
    }

    #[test]
    fn expire_fires_exactly_once() {
        let mut countdown = Countdown::default();
        let epoch = countdown.arm();
        assert!(countdown.expire(epoch));
        assert!(!countdown.expire(epoch));
    }

    #[test]
    fn cancel_prevents_expiry() {
        let mut countdown = Countdown::default();
        let epoch = countdown.arm();
        countdown.cancel();
        assert!(!countdown.expire(epoch));
    }

    #[tokio::test]
    async fn attach_after_rearm_is_ignored_and_stale_task_aborted() {
        let mut countdown = Countdown::default();
        let stale_epoch = countdown.arm();
        let stale_task = tokio::spawn(std::future::pending::<()>());
        let stale_handle = stale_task.abort_handle();
        countdown.attach(stale_epoch, stale_handle);

        // Re-arming aborts the stale task; attaching with the old epoch is a no-op.
        let fresh_epoch = countdown.arm();
        let orphan = tokio::spawn(std::future::pending::<()>());
        countdown.attach(stale_epoch, orphan.abort_handle());
        assert!(countdown.is_current(fresh_epoch));

        assert!(stale_task.await.unwrap_err().is_cancelled());
        orphan.abort();
    }
}
