use std::path::PathBuf;

use breakwall_core::simulation::{run_scenario, ScheduledInput, SimulationScenario};
use chrono::{DateTime, Utc};
use clap::Args;

/// Pointer displacement used for `--move-at`, well past the jitter threshold.
const MOVE_DISTANCE: f64 = 10.0;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Work length in seconds
    #[arg(long, default_value_t = 1500)]
    work_secs: u64,
    /// Break length in seconds
    #[arg(long, default_value_t = 300)]
    break_secs: u64,
    /// Ticks to run [default: one cycle plus 10]
    #[arg(long)]
    ticks: Option<u64>,
    /// Move the pointer at this offset in seconds (repeatable)
    #[arg(long = "move-at")]
    move_at: Vec<f64>,
    /// Press a key at this offset in seconds (repeatable)
    #[arg(long = "key-at")]
    key_at: Vec<f64>,
    /// Press the skip control at this offset in seconds
    #[arg(long)]
    skip_at: Option<f64>,
    /// Suspend the machine right before this tick
    #[arg(long)]
    sleep_at: Option<u64>,
    /// Length of the suspension in seconds
    #[arg(long, default_value_t = 0)]
    sleep_secs: u64,
    /// Replay a scenario file (JSON) instead of the flags above
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Wall-clock start (RFC 3339) [default: now]
    #[arg(long)]
    start: Option<DateTime<Utc>>,
    /// Print counts instead of event lines
    #[arg(long)]
    summary: bool,
}

impl SimulateArgs {
    fn scenario(&self) -> Result<SimulationScenario, Box<dyn std::error::Error>> {
        if let Some(path) = &self.scenario {
            return Ok(SimulationScenario::load_from(path)?);
        }

        let mut scenario = SimulationScenario::new("cli", self.work_secs, self.break_secs);
        if let Some(ticks) = self.ticks {
            scenario = scenario.with_ticks(ticks);
        }
        for &at in &self.move_at {
            scenario = scenario.with_input(
                at,
                ScheduledInput::PointerMove {
                    dx: MOVE_DISTANCE,
                    dy: 0.0,
                },
            );
        }
        for &at in &self.key_at {
            scenario = scenario.with_input(at, ScheduledInput::Keystroke);
        }
        if let Some(at) = self.skip_at {
            scenario = scenario.with_input(at, ScheduledInput::Skip);
        }
        if let Some(tick) = self.sleep_at {
            scenario = scenario.with_sleep(tick, self.sleep_secs);
        }
        Ok(scenario)
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = args.scenario()?;
    let start = args.start.unwrap_or_else(Utc::now);
    let result = run_scenario(&scenario, start)?;

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&result.metrics)?);
        return Ok(());
    }
    for event in &result.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(&result.final_state)?);
    Ok(())
}
