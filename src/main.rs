// Runs one traffic light and a vehicle that crosses a few times, waiting for
// green before each crossing.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trafficlight_signal::{CycleTiming, TrafficLight};

#[derive(Debug, Parser)]
#[command(version, about = "Cycle a traffic light and drive a vehicle through it")]
struct Args {
    /// Shortest time the light stays in one phase
    #[arg(long, env = "TRAFFICLIGHT_MIN_CYCLE", default_value = "4s", value_parser = humantime::parse_duration)]
    min_cycle: Duration,

    /// Longest time the light stays in one phase
    #[arg(long, env = "TRAFFICLIGHT_MAX_CYCLE", default_value = "6s", value_parser = humantime::parse_duration)]
    max_cycle: Duration,

    /// Pause after each phase change
    #[arg(long, env = "TRAFFICLIGHT_SETTLE", default_value = "1ms", value_parser = humantime::parse_duration)]
    settle: Duration,

    /// Number of times the vehicle crosses before the program exits
    #[arg(long, default_value_t = 3)]
    crossings: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// TRAFFICLIGHT_LOG takes precedence over -v.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env("TRAFFICLIGHT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn drive(light: &TrafficLight, crossings: u32) {
    for crossing in 1..=crossings {
        info!(crossing, phase = %light.current_phase(), "vehicle waiting at the light");

        let waiting_since = Instant::now();
        light.wait_for_green();

        info!(
            crossing,
            waited = ?waiting_since.elapsed(),
            "light is green, vehicle crosses"
        );
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let timing = CycleTiming::new(args.min_cycle, args.max_cycle)
        .context("invalid cycle timing")?
        .with_settle(args.settle);

    let light = Arc::new(TrafficLight::with_timing(timing));
    let simulation = light.simulate()?;

    let vehicle = {
        let light = Arc::clone(&light);
        let crossings = args.crossings;
        thread::Builder::new()
            .name("vehicle".to_string())
            .spawn(move || drive(&light, crossings))
            .context("failed to spawn the vehicle thread")?
    };
    vehicle
        .join()
        .map_err(|_| anyhow!("vehicle thread panicked"))?;

    simulation.stop()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_directives() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(3), "trace");
        assert_eq!(verbosity_to_directive(255), "trace");
    }

    #[test]
    fn defaults_match_the_four_to_six_second_cycle() {
        let args = Args::try_parse_from(["trafficlight-signal"]).unwrap();
        assert_eq!(args.min_cycle, Duration::from_secs(4));
        assert_eq!(args.max_cycle, Duration::from_secs(6));
        assert_eq!(args.settle, Duration::from_millis(1));
        assert_eq!(args.crossings, 3);
    }

    #[test]
    fn durations_accept_humantime_syntax() {
        let args = Args::try_parse_from([
            "trafficlight-signal",
            "--min-cycle",
            "250ms",
            "--max-cycle",
            "1s 500ms",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.min_cycle, Duration::from_millis(250));
        assert_eq!(args.max_cycle, Duration::from_millis(1500));
        assert_eq!(args.verbose, 2);
    }
}
