/*
 * The background phase cycle and the handle that controls it.
 *
 * Each iteration sleeps for a freshly drawn duration, toggles the phase and
 * publishes it, then pauses briefly before the next draw. The phase is changed
 * and published under the phase lock, so the published sequence alternates in
 * the same order as the phase itself. The queue lock is always taken inside the
 * phase lock and never the other way round.
 */

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::stop_signal::StopSignal;
use super::timing::CycleTiming;
use super::{Phase, PhaseState, lock_state};
use crate::error::TrafficLightError;
use crate::message_queue::MessageQueue;

pub(super) struct PhaseCycle {
    pub(super) state: Arc<Mutex<PhaseState>>,
    pub(super) phase_changes: Arc<MessageQueue<Phase>>,
    pub(super) timing: CycleTiming,
    pub(super) stop: Arc<StopSignal>,
}

impl PhaseCycle {
    pub(super) fn run(self) {
        info!(
            min_cycle = ?self.timing.min_cycle(),
            max_cycle = ?self.timing.max_cycle(),
            "phase cycle started"
        );

        let mut rng = rand::thread_rng();
        loop {
            let cycle = self.timing.draw(&mut rng);
            let started = Instant::now();
            if self.stop.sleep(cycle) {
                break;
            }

            self.finish_cycle(cycle, started.elapsed());

            if self.stop.sleep(self.timing.settle()) {
                break;
            }
        }

        info!("phase cycle stopped");
    }

    /*
     * Toggles once the drawn duration has really passed. A wake before that
     * publishes nothing; the next iteration tries again rather than publish a
     * short phase.
     */
    fn finish_cycle(&self, cycle: Duration, elapsed: Duration) -> Option<Phase> {
        if elapsed < cycle {
            warn!(?cycle, ?elapsed, "woke before the cycle elapsed, skipping toggle");
            return None;
        }

        let phase = self.toggle();
        debug!(%phase, ?cycle, ?elapsed, "phase changed");
        Some(phase)
    }

    fn toggle(&self) -> Phase {
        let mut state = lock_state(&self.state);
        let phase = state.advance();
        self.phase_changes.send(phase);
        phase
    }
}

/*
 * Handle to a running phase cycle.
 *
 * Dropping the handle detaches the cycle, which then keeps running for as long
 * as the process does. `stop` ends it instead, interrupting whatever sleep the
 * cycle is in.
 */
#[derive(Debug)]
pub struct Simulation {
    stop: Arc<StopSignal>,
    thread: JoinHandle<()>,
}

impl Simulation {
    pub(super) fn new(stop: Arc<StopSignal>, thread: JoinHandle<()>) -> Self {
        Simulation { stop, thread }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stops the cycle and waits for its thread to exit.
    pub fn stop(self) -> Result<(), TrafficLightError> {
        self.stop.raise();
        self.thread
            .join()
            .map_err(|_| TrafficLightError::CyclePanicked)
    }
}
