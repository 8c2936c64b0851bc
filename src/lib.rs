/*
 * A single traffic light that toggles between red and green on a jittered
 * interval, plus the blocking queue the light uses to tell waiting vehicles
 * about each phase change.
 *
 * The light runs its cycle on a background thread. Anything that wants to
 * cross calls `TrafficLight::wait_for_green` from its own thread and is parked
 * until the cycle publishes a green phase.
 */

pub mod error;
pub mod message_queue;
pub mod trafficlight;

pub use error::{TimingError, TrafficLightError, WaitTimeoutError};
pub use message_queue::MessageQueue;
pub use trafficlight::{CycleTiming, Phase, Simulation, TrafficLight};
