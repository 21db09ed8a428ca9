//! Deterministic replay of a session.
//!
//! A [`SimulationScenario`] lists work/break lengths, a tick count and user
//! activity at fixed offsets. [`run_scenario`] replays it through the
//! [`Runtime`] on a [`ManualClock`] with headless collaborators, stepping
//! wall time in 100 ms increments so arming deadlines and sub-second input
//! land where they would in a live run.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, ManualClock};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::headless::{HeadlessOverlay, ManualInput};
use crate::runtime::{Command, Runtime};
use crate::timer::{Durations, EnforcementSettings, Session};

const STEP_MS: i64 = 100;
const STEPS_PER_TICK: i64 = 1_000 / STEP_MS;
/// Longest simulated suspension: one year.
const MAX_SLEEP_SECS: u64 = 365 * 24 * 60 * 60;

/// User activity injected into a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduledInput {
    PointerMove { dx: f64, dy: f64 },
    Keystroke,
    Skip,
    Stop,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedInput {
    /// Wall-clock offset from the start of the replay, sleeps included.
    pub at_ms: i64,
    pub input: ScheduledInput,
}

/// The machine is suspended for `secs` right before tick `before_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepGap {
    pub before_tick: u64,
    pub secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub name: String,
    pub work_secs: u64,
    pub break_secs: u64,
    pub ticks: u64,
    #[serde(default)]
    pub settings: EnforcementSettings,
    #[serde(default)]
    pub inputs: Vec<TimedInput>,
    #[serde(default)]
    pub sleeps: Vec<SleepGap>,
}

impl SimulationScenario {
    /// One full cycle plus a little slack by default.
    pub fn new(name: impl Into<String>, work_secs: u64, break_secs: u64) -> Self {
        Self {
            name: name.into(),
            work_secs,
            break_secs,
            ticks: work_secs.saturating_add(break_secs).saturating_add(10),
            settings: EnforcementSettings::default(),
            inputs: Vec::new(),
            sleeps: Vec::new(),
        }
    }

    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_settings(mut self, settings: EnforcementSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_input(mut self, at_secs: f64, input: ScheduledInput) -> Self {
        self.inputs.push(TimedInput {
            at_ms: (at_secs * 1_000.0).round() as i64,
            input,
        });
        self
    }

    pub fn with_sleep(mut self, before_tick: u64, secs: u64) -> Self {
        self.sleeps.push(SleepGap { before_tick, secs });
        self
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Counts of notable events in a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub breaks_started: u32,
    pub breaks_completed: u32,
    pub breaks_skipped: u32,
    pub punishments: u32,
    pub restarts: u32,
    pub ready_gates_dismissed: u32,
}

impl SimulationMetrics {
    pub fn from_events(events: &[Event]) -> Self {
        let mut metrics = Self::default();
        for event in events {
            match event {
                Event::BreakStarted { .. } => metrics.breaks_started += 1,
                Event::BreakCompleted { .. } => metrics.breaks_completed += 1,
                Event::BreakSkipped { .. } => metrics.breaks_skipped += 1,
                Event::BreakPunished { .. } => metrics.punishments += 1,
                Event::WorkRestarted { .. } => metrics.restarts += 1,
                Event::ReadyGateDismissed { .. } => metrics.ready_gates_dismissed += 1,
                _ => {}
            }
        }
        metrics
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario: String,
    pub events: Vec<Event>,
    pub metrics: SimulationMetrics,
    /// Snapshot taken after the last tick.
    pub final_state: Event,
}

/// Replay `scenario` starting at `start`. The session is started before the
/// first tick.
pub fn run_scenario(
    scenario: &SimulationScenario,
    start: DateTime<Utc>,
) -> Result<SimulationResult, ValidationError> {
    let durations = Durations::from_secs(scenario.work_secs, scenario.break_secs)?;
    scenario.settings.validate()?;
    if let Some(gap) = scenario.sleeps.iter().find(|s| s.secs > MAX_SLEEP_SECS) {
        return Err(ValidationError::InvalidValue {
            field: "sleeps".into(),
            message: format!("{} s before tick {} exceeds {MAX_SLEEP_SECS} s", gap.secs, gap.before_tick),
        });
    }
    let clock = ManualClock::new(start);
    let runtime = Runtime::new(
        Session::new(durations, scenario.settings),
        &clock,
        HeadlessOverlay::default(),
        ManualInput::default(),
    );

    let mut inputs = scenario.inputs.clone();
    inputs.sort_by_key(|i| i.at_ms);

    let mut replay = Replay {
        clock: &clock,
        start,
        runtime,
        inputs: inputs.into_iter().peekable(),
        events: Vec::new(),
    };

    replay.command(Command::Toggle);
    let mut offset_ms = 0;
    for tick in 1..=scenario.ticks {
        let base_ms = offset_ms + (tick as i64 - 1) * 1_000;
        for step in 1..STEPS_PER_TICK {
            replay.advance_to(base_ms + step * STEP_MS);
        }
        offset_ms += scenario
            .sleeps
            .iter()
            .filter(|s| s.before_tick == tick)
            .map(|s| s.secs as i64 * 1_000)
            .sum::<i64>();
        replay.advance_to(offset_ms + tick as i64 * 1_000);
        let event = replay.runtime.tick();
        replay.record(event);
    }

    let final_state = replay.runtime.session().snapshot(clock.now());
    let metrics = SimulationMetrics::from_events(&replay.events);
    Ok(SimulationResult {
        scenario: scenario.name.clone(),
        events: replay.events,
        metrics,
        final_state,
    })
}

struct Replay<'a, It: Iterator<Item = TimedInput>> {
    clock: &'a ManualClock,
    start: DateTime<Utc>,
    runtime: Runtime<&'a ManualClock, HeadlessOverlay, ManualInput>,
    inputs: std::iter::Peekable<It>,
    events: Vec<Event>,
}

impl<It: Iterator<Item = TimedInput>> Replay<'_, It> {
    fn record(&mut self, event: Option<Event>) {
        self.events.extend(event);
    }

    fn command(&mut self, command: Command) {
        let event = self.runtime.handle(command);
        self.record(event);
    }

    /// Move the clock, fire a due arming deadline, then deliver due inputs.
    fn advance_to(&mut self, offset_ms: i64) {
        self.clock.set(self.start + Duration::milliseconds(offset_ms));
        let now = self.clock.now();
        self.runtime.input_mut().set_now(now);

        if self.runtime.session().next_arm_at().is_some_and(|at| at <= now) {
            self.runtime.fire_arm();
        }

        while let Some(next) = self.inputs.next_if(|i| i.at_ms <= offset_ms) {
            self.apply(next.input, now);
        }
    }

    fn apply(&mut self, input: ScheduledInput, now: DateTime<Utc>) {
        match input {
            ScheduledInput::PointerMove { dx, dy } => {
                let pos = self.runtime.input_mut().move_pointer_by(dx, dy);
                self.command(Command::PointerMoved(pos));
            }
            ScheduledInput::Keystroke => self.runtime.input_mut().press_key(now),
            ScheduledInput::Skip => self.command(Command::Skip),
            ScheduledInput::Stop => self.command(Command::Stop),
            ScheduledInput::Toggle => self.command(Command::Toggle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;

    fn at(start: DateTime<Utc>, event: &Event) -> Duration {
        let when = match event {
            Event::BreakStarted { at, .. }
            | Event::BreakCompleted { at }
            | Event::BreakPunished { at, .. }
            | Event::BreakSkipped { at, .. } => *at,
            other => panic!("unexpected event {other:?}"),
        };
        when - start
    }

    #[test]
    fn default_cycle_with_pointer_move() {
        let start = Utc::now();
        let scenario = SimulationScenario::new("pointer", 1500, 300)
            .with_input(1502.5, ScheduledInput::PointerMove { dx: 10.0, dy: 0.0 });
        let result = run_scenario(&scenario, start).unwrap();

        assert!(matches!(result.events[0], Event::WorkStarted { duration_secs: 1500, .. }));
        assert_eq!(at(start, &result.events[1]), Duration::seconds(1500));
        assert_eq!(at(start, &result.events[2]), Duration::milliseconds(1_502_500));
        assert_eq!(at(start, &result.events[3]), Duration::seconds(1803));
        assert_eq!(result.metrics.punishments, 1);
        assert_eq!(result.metrics.breaks_completed, 1);
        match result.final_state {
            Event::StateSnapshot { ready_gate, phase, .. } => {
                assert!(ready_gate);
                assert_eq!(phase, Some(Phase::Break));
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn pointer_move_on_tick_boundary() {
        let start = Utc::now();
        let scenario = SimulationScenario::new("boundary", 1500, 300)
            .with_input(1502.0, ScheduledInput::PointerMove { dx: 10.0, dy: 0.0 });
        let result = run_scenario(&scenario, start).unwrap();
        assert_eq!(at(start, &result.events[2]), Duration::seconds(1502));
        assert_eq!(at(start, &result.events[3]), Duration::seconds(1803));
        assert_eq!(result.metrics.punishments, 1);
    }

    #[test]
    fn motion_before_arming_is_ignored() {
        let scenario = SimulationScenario::new("early", 10, 20)
            .with_input(11.0, ScheduledInput::PointerMove { dx: 50.0, dy: 50.0 });
        let result = run_scenario(&scenario, Utc::now()).unwrap();
        assert_eq!(result.metrics.punishments, 0);
        assert_eq!(result.metrics.breaks_completed, 1);
    }

    #[test]
    fn keystrokes_extend_break() {
        let start = Utc::now();
        let scenario = SimulationScenario::new("keys", 10, 20)
            .with_input(12.3, ScheduledInput::Keystroke)
            .with_input(20.0, ScheduledInput::Keystroke);
        let result = run_scenario(&scenario, start).unwrap();
        assert_eq!(result.metrics.punishments, 2);
        let completed = result
            .events
            .iter()
            .find(|e| matches!(e, Event::BreakCompleted { .. }))
            .unwrap();
        assert_eq!(at(start, completed), Duration::seconds(36));
    }

    #[test]
    fn skip_and_ready_gate_cycle() {
        let scenario = SimulationScenario::new("skip", 5, 60)
            .with_ticks(20)
            .with_input(10.0, ScheduledInput::Skip);
        let result = run_scenario(&scenario, Utc::now()).unwrap();
        assert_eq!(result.metrics.breaks_skipped, 1);
        assert_eq!(result.metrics.breaks_started, 2);
        assert_eq!(result.metrics.breaks_completed, 0);
    }

    #[test]
    fn sleep_gap_restarts_work() {
        let scenario = SimulationScenario::new("sleep", 1500, 300)
            .with_ticks(700)
            .with_sleep(600, 400);
        let result = run_scenario(&scenario, Utc::now()).unwrap();
        assert_eq!(result.metrics.restarts, 1);
        assert_eq!(result.metrics.breaks_started, 0);
        match result.final_state {
            Event::StateSnapshot { seconds_remaining, .. } => assert_eq!(seconds_remaining, 1400),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        let scenario = SimulationScenario::new("zero", 0, 60);
        assert!(run_scenario(&scenario, Utc::now()).is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let huge_break = SimulationScenario::new("huge", 60, 200_000_000_000_000);
        assert!(matches!(
            run_scenario(&huge_break, Utc::now()),
            Err(ValidationError::InvalidValue { .. })
        ));
        let long_sleep = SimulationScenario::new("sleep", 60, 30).with_sleep(5, u64::MAX);
        assert!(run_scenario(&long_sleep, Utc::now()).is_err());
        let settings = EnforcementSettings {
            punishment_secs: u64::MAX,
            ..EnforcementSettings::default()
        };
        let bad_settings = SimulationScenario::new("settings", 60, 30).with_settings(settings);
        assert!(run_scenario(&bad_settings, Utc::now()).is_err());
    }

    #[test]
    fn scenario_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        let scenario = SimulationScenario::new("file", 60, 30)
            .with_input(61.0, ScheduledInput::Keystroke)
            .with_sleep(5, 10);
        scenario.save_to(&path).unwrap();
        assert_eq!(SimulationScenario::load_from(&path).unwrap(), scenario);
    }
}
