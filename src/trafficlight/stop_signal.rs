/*
 * A one-way stop flag for the phase cycle.
 *
 * The cycle spends nearly all of its time sleeping, so a plain flag checked
 * once per iteration would take up to a full phase to be noticed. Sleeping on
 * this signal instead lets `raise` cut the sleep short.
 */

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    condition: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn raise(&self) {
        *self.lock() = true;
        self.condition.notify_all();
    }

    /*
     * Sleeps for `duration` unless the signal is raised first. Returns whether
     * the signal is raised. Spurious wakeups resume the sleep for whatever is
     * left of the duration. A duration too large for a deadline sleeps until
     * the signal is raised.
     */
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut stopped = self.lock();
        let Some(deadline) = Instant::now().checked_add(duration) else {
            while !*stopped {
                stopped = self
                    .condition
                    .wait(stopped)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return true;
        };

        while !*stopped {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            stopped = self
                .condition
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        *stopped
    }
}
