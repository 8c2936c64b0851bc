/*
 * How long each phase lasts.
 *
 * Every cycle draws a fresh duration uniformly from `[min_cycle, max_cycle]`
 * at millisecond resolution, so lights started together drift apart. After a
 * toggle the cycle pauses for `settle` before drawing the next duration.
 */

use std::time::Duration;

use rand::Rng;

use crate::error::TimingError;

pub const DEFAULT_MIN_CYCLE: Duration = Duration::from_millis(4000);
pub const DEFAULT_MAX_CYCLE: Duration = Duration::from_millis(6000);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1);

/// Draws are whole milliseconds counted in a `u64`.
pub const MAX_CYCLE: Duration = Duration::from_millis(u64::MAX);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    min_cycle: Duration,
    max_cycle: Duration,
    settle: Duration,
}

impl CycleTiming {
    pub fn new(min_cycle: Duration, max_cycle: Duration) -> Result<Self, TimingError> {
        if min_cycle.is_zero() {
            return Err(TimingError::ZeroCycle);
        }
        if max_cycle > MAX_CYCLE {
            return Err(TimingError::CycleTooLong { max: max_cycle });
        }
        if min_cycle > max_cycle {
            return Err(TimingError::InvertedRange {
                min: min_cycle,
                max: max_cycle,
            });
        }

        Ok(CycleTiming {
            min_cycle,
            max_cycle,
            settle: DEFAULT_SETTLE,
        })
    }

    pub fn with_settle(self, settle: Duration) -> Self {
        CycleTiming { settle, ..self }
    }

    pub fn min_cycle(&self) -> Duration {
        self.min_cycle
    }

    pub fn max_cycle(&self) -> Duration {
        self.max_cycle
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Picks the next phase duration, both bounds inclusive.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = u64::try_from(self.min_cycle.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_cycle.as_millis()).unwrap_or(u64::MAX);
        if min >= max {
            return self.min_cycle;
        }
        // sub-millisecond bounds would otherwise round out of the range
        Duration::from_millis(rng.gen_range(min..=max)).clamp(self.min_cycle, self.max_cycle)
    }
}

impl Default for CycleTiming {
    fn default() -> Self {
        CycleTiming {
            min_cycle: DEFAULT_MIN_CYCLE,
            max_cycle: DEFAULT_MAX_CYCLE,
            settle: DEFAULT_SETTLE,
        }
    }
}
