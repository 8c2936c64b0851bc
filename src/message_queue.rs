/*
 * An unbounded FIFO that moves values from a producer thread to a consumer
 * thread.
 *
 * `send` never blocks. `receive` parks the calling thread on a condition
 * variable until a value is available. Every value is delivered to exactly one
 * receiver; with several receivers on one queue they compete for values, they
 * do not each see a copy.
 *
 * The deque is only touched with the mutex held. None of the operations can
 * leave it half-modified, so a poisoned lock is recovered instead of
 * propagated: a panic elsewhere never makes the queue unusable.
 */

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::WaitTimeoutError;

pub struct MessageQueue<T> {
    queue: Mutex<VecDeque<T>>,
    condition: Condvar,
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        MessageQueue {
            queue: Mutex::new(VecDeque::new()),
            condition: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` to the tail and wakes one waiting receiver.
    pub fn send(&self, value: T) {
        self.lock().push_back(value);
        self.condition.notify_one();
    }

    /// Removes and returns the head, parking until one is available.
    ///
    /// Blocks forever if nothing is ever sent.
    pub fn receive(&self) -> T {
        let mut queue = self.lock();

        loop {
            // re-checked after every wake, spurious or not
            if let Some(value) = queue.pop_front() {
                return value;
            }
            queue = self
                .condition
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like `receive`, but gives up once `timeout` has passed.
    ///
    /// A timeout too large to express as a deadline waits without bound.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, WaitTimeoutError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.receive());
        };
        let mut queue = self.lock();

        loop {
            if let Some(value) = queue.pop_front() {
                return Ok(value);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(WaitTimeoutError { timeout });
            }

            queue = self
                .condition
                .wait_timeout(queue, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("pending", &self.len())
            .finish()
    }
}
