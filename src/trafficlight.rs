/*
 * A traffic light with two phases, red and green.
 *
 * The light owns the current phase and a queue of phase changes. Once
 * `simulate` has started the cycle, a background thread toggles the phase
 * every few seconds and publishes each new phase on the queue. Vehicles call
 * `wait_for_green` to park until the cycle publishes a green phase.
 *
 * The queue is a work queue, not a broadcast: every phase change is delivered
 * to exactly one waiting caller. Several vehicles waiting on the same light at
 * once compete for the changes, so a light is meant to be waited on by one
 * vehicle at a time.
 */

mod simulation;
mod stop_signal;
pub mod timing;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use enum_ordinalize::Ordinalize;
use tracing::warn;

use crate::error::{TrafficLightError, WaitTimeoutError};
use crate::message_queue::MessageQueue;
use simulation::PhaseCycle;
pub use simulation::Simulation;
use stop_signal::StopSignal;
pub use timing::CycleTiming;

#[derive(Debug, Ordinalize, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    pub fn toggled(self) -> Phase {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Red => "red",
            Phase::Green => "green",
        })
    }
}

#[derive(Debug)]
struct PhaseState {
    current: Phase,
    entered: [u64; Phase::VARIANT_COUNT],
}

impl PhaseState {
    const fn new() -> Self {
        PhaseState {
            current: Phase::Red,
            entered: [0; Phase::VARIANT_COUNT],
        }
    }

    fn advance(&mut self) -> Phase {
        self.current = self.current.toggled();
        self.entered[self.current.ordinal() as usize] += 1;
        self.current
    }
}

fn lock_state(state: &Mutex<PhaseState>) -> MutexGuard<'_, PhaseState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct TrafficLight {
    state: Arc<Mutex<PhaseState>>,
    phase_changes: Arc<MessageQueue<Phase>>,
    timing: CycleTiming,
    simulating: AtomicBool,
}

impl TrafficLight {
    /// A red light cycling every 4 to 6 seconds once simulated.
    pub fn new() -> Self {
        Self::with_timing(CycleTiming::default())
    }

    pub fn with_timing(timing: CycleTiming) -> Self {
        TrafficLight {
            state: Arc::new(Mutex::new(PhaseState::new())),
            phase_changes: Arc::new(MessageQueue::new()),
            timing,
            simulating: AtomicBool::new(false),
        }
    }

    pub fn timing(&self) -> CycleTiming {
        self.timing
    }

    pub fn current_phase(&self) -> Phase {
        lock_state(&self.state).current
    }

    /// How many times the cycle has switched into `phase`.
    pub fn times_entered(&self, phase: Phase) -> u64 {
        lock_state(&self.state).entered[phase.ordinal() as usize]
    }

    /*
     * Takes the next phase change off the queue, parking until the cycle
     * publishes one. The initial red phase is never published, only toggles.
     */
    pub fn next_phase_change(&self) -> Phase {
        self.phase_changes.receive()
    }

    pub fn next_phase_change_timeout(&self, timeout: Duration) -> Result<Phase, WaitTimeoutError> {
        self.phase_changes.receive_timeout(timeout)
    }

    /// Parks until a change to `phase` is published, discarding other changes.
    pub fn wait_for(&self, phase: Phase) {
        while self.next_phase_change() != phase {}
    }

    pub fn wait_for_green(&self) {
        self.wait_for(Phase::Green);
    }

    /// Like `wait_for`, with one deadline covering all the discarded changes.
    pub fn wait_for_timeout(&self, phase: Phase, timeout: Duration) -> Result<(), WaitTimeoutError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_for(phase);
            return Ok(());
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.phase_changes.receive_timeout(remaining) {
                Ok(received) if received == phase => return Ok(()),
                Ok(_) => continue,
                Err(_) => return Err(WaitTimeoutError { timeout }),
            }
        }
    }

    pub fn wait_for_green_timeout(&self, timeout: Duration) -> Result<(), WaitTimeoutError> {
        self.wait_for_timeout(Phase::Green, timeout)
    }

    /*
     * Starts the phase cycle on its own thread and returns straight away.
     *
     * A light only ever runs one cycle: two cycles would race on the phase and
     * publish out of step, so every call after the first is refused, even
     * after the first cycle has been stopped.
     */
    pub fn simulate(&self) -> Result<Simulation, TrafficLightError> {
        if self.simulating.swap(true, Ordering::AcqRel) {
            warn!("simulate called on a light that is already cycling");
            return Err(TrafficLightError::AlreadySimulating);
        }

        let stop = Arc::new(StopSignal::new());
        let cycle = PhaseCycle {
            state: Arc::clone(&self.state),
            phase_changes: Arc::clone(&self.phase_changes),
            timing: self.timing,
            stop: Arc::clone(&stop),
        };

        let thread = thread::Builder::new()
            .name("trafficlight-cycle".to_string())
            .spawn(move || cycle.run())
            .map_err(|error| {
                self.simulating.store(false, Ordering::Release);
                TrafficLightError::Spawn(error)
            })?;

        Ok(Simulation::new(stop, thread))
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_timing() -> CycleTiming {
        CycleTiming::new(Duration::from_millis(20), Duration::from_millis(30)).unwrap()
    }

    #[test]
    fn phase_toggles_between_red_and_green() {
        assert_eq!(Phase::Red.toggled(), Phase::Green);
        assert_eq!(Phase::Green.toggled(), Phase::Red);
        assert_eq!(Phase::VARIANT_COUNT, 2);
    }

    #[test]
    fn phase_displays_lowercase() {
        assert_eq!(Phase::Red.to_string(), "red");
        assert_eq!(Phase::Green.to_string(), "green");
    }

    #[test]
    fn new_light_is_red_and_has_not_cycled() {
        let light = TrafficLight::new();
        assert_eq!(light.current_phase(), Phase::Red);
        assert_eq!(light.times_entered(Phase::Red), 0);
        assert_eq!(light.times_entered(Phase::Green), 0);
        assert_eq!(light.timing(), CycleTiming::default());
    }

    #[test]
    fn advance_counts_each_phase_entered() {
        let mut state = PhaseState::new();
        assert_eq!(state.advance(), Phase::Green);
        assert_eq!(state.advance(), Phase::Red);
        assert_eq!(state.advance(), Phase::Green);
        assert_eq!(state.entered, [1, 2]);
    }

    #[test]
    fn wait_times_out_when_light_is_not_simulating() {
        let light = TrafficLight::with_timing(fast_timing());
        let timeout = Duration::from_millis(50);
        assert_eq!(
            light.wait_for_green_timeout(timeout),
            Err(WaitTimeoutError { timeout })
        );
        assert_eq!(light.current_phase(), Phase::Red);
    }

    #[test]
    fn unbounded_timeouts_fall_back_to_blocking_waits() {
        let light = TrafficLight::with_timing(fast_timing());
        let simulation = light.simulate().unwrap();

        assert_eq!(light.next_phase_change_timeout(Duration::MAX), Ok(Phase::Green));
        light.wait_for_green_timeout(Duration::MAX).unwrap();
        assert!(light.times_entered(Phase::Green) >= 2);

        simulation.stop().unwrap();
    }

    #[test]
    fn wait_for_green_returns_once_light_turns_green() {
        let light = TrafficLight::with_timing(fast_timing());
        let simulation = light.simulate().unwrap();

        light.wait_for_green();
        assert_eq!(light.current_phase(), Phase::Green);
        assert!(light.times_entered(Phase::Green) >= 1);

        simulation.stop().unwrap();
    }

    #[test]
    fn wait_for_red_skips_green() {
        let light = TrafficLight::with_timing(fast_timing());
        let simulation = light.simulate().unwrap();

        light.wait_for_timeout(Phase::Red, Duration::from_secs(5)).unwrap();
        assert!(light.times_entered(Phase::Green) >= 1);
        assert!(light.times_entered(Phase::Red) >= 1);

        simulation.stop().unwrap();
    }

    #[test]
    fn simulate_is_one_shot() {
        let light = TrafficLight::with_timing(fast_timing());
        let simulation = light.simulate().unwrap();

        assert!(matches!(
            light.simulate(),
            Err(TrafficLightError::AlreadySimulating)
        ));

        simulation.stop().unwrap();
        assert!(matches!(
            light.simulate(),
            Err(TrafficLightError::AlreadySimulating)
        ));
    }
}
