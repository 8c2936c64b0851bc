//! Error types for the traffic light.
//!
//! The blocking core never fails; these cover the additive API only: the
//! one-shot `simulate`, timing validation and the timeout-bounded waits.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures starting or stopping the background cycle.
#[derive(Debug, Error)]
pub enum TrafficLightError {
    /// `simulate` was already called on this light.
    #[error("traffic light is already simulating")]
    AlreadySimulating,

    /// The operating system refused to start the cycle thread.
    #[error("failed to spawn the phase cycle thread: {0}")]
    Spawn(#[from] io::Error),

    /// The cycle thread panicked before it could be joined.
    #[error("the phase cycle thread panicked")]
    CyclePanicked,
}

/// Rejected cycle timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("minimum cycle duration must be greater than zero")]
    ZeroCycle,

    #[error("minimum cycle duration {min:?} exceeds maximum {max:?}")]
    InvertedRange { min: Duration, max: Duration },

    #[error("maximum cycle duration {max:?} does not fit in u64 milliseconds")]
    CycleTooLong { max: Duration },
}

/// A bounded wait ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {timeout:?}")]
pub struct WaitTimeoutError {
    pub timeout: Duration,
}
