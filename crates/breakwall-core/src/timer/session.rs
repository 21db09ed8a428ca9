//! Session state machine.
//!
//! The session is a wall-clock-based state machine. It does not use internal
//! threads or timers - the caller delivers ticks, pointer motion and arming
//! deadlines, each with the current time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Work <-> Paused
//!          |
//!          v
//!        Break --skip--> Work
//!          |
//!          v
//!        Ready --motion--> Work
//! ```
//!
//! `stop()` returns to `Idle` from anywhere. Only one of work ticking, a
//! break, or the ready gate is ever live: they are variants of one enum.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(Durations::default(), EnforcementSettings::default());
//! session.start(now);
//! // Once per second:
//! session.tick(now, &mut overlay, &mut input);
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::enforcement::{rescale_remaining, BreakEnforcement, BreakOutcome};
use super::ready_gate::{GateOutcome, ReadyGate};
use super::settings::{minutes_to_secs, Durations, EnforcementSettings};
use crate::error::ValidationError;
use crate::events::Event;
use crate::input::{InputMonitor, PointerPosition};
use crate::overlay::OverlaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    /// Includes the ready gate that follows a break.
    Break,
}

/// What the start/pause control should offer. The presentation layer maps
/// this onto a concrete widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
    /// A break or ready gate is up; the control is inert.
    Disabled,
    Start,
    Pause,
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationKind {
    Work,
    Break,
}

/// Countdown for one work session.
#[derive(Debug, Clone, Copy)]
struct WorkClock {
    total_secs: u64,
    seconds_remaining: u64,
    last_tick: DateTime<Utc>,
}

impl WorkClock {
    fn fresh(total_secs: u64, now: DateTime<Utc>) -> Self {
        Self {
            total_secs,
            seconds_remaining: total_secs,
            last_tick: now,
        }
    }
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Idle,
    Work(WorkClock),
    Paused(WorkClock),
    Break(BreakEnforcement),
    Ready(ReadyGate),
}

#[derive(Debug)]
pub struct Session {
    durations: Durations,
    settings: EnforcementSettings,
    stage: Stage,
}

impl Session {
    /// Create an idle session.
    pub fn new(durations: Durations, settings: EnforcementSettings) -> Self {
        Self {
            durations,
            settings,
            stage: Stage::Idle,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match self.stage {
            Stage::Idle => SessionState::Idle,
            Stage::Paused(_) => SessionState::Paused,
            Stage::Work(_) | Stage::Break(_) | Stage::Ready(_) => SessionState::Running,
        }
    }

    /// `None` while idle.
    pub fn phase(&self) -> Option<Phase> {
        match self.stage {
            Stage::Idle => None,
            Stage::Work(_) | Stage::Paused(_) => Some(Phase::Work),
            Stage::Break(_) | Stage::Ready(_) => Some(Phase::Break),
        }
    }

    pub fn affordance(&self) -> Affordance {
        match self.stage {
            Stage::Idle => Affordance::Start,
            Stage::Work(_) => Affordance::Pause,
            Stage::Paused(_) => Affordance::Resume,
            Stage::Break(_) | Stage::Ready(_) => Affordance::Disabled,
        }
    }

    pub fn seconds_remaining(&self) -> u64 {
        match &self.stage {
            Stage::Work(w) | Stage::Paused(w) => w.seconds_remaining,
            Stage::Break(b) => b.seconds_remaining(),
            Stage::Idle | Stage::Ready(_) => 0,
        }
    }

    pub fn total_secs(&self) -> u64 {
        match &self.stage {
            Stage::Work(w) | Stage::Paused(w) => w.total_secs,
            Stage::Break(b) => b.total_secs(),
            Stage::Idle | Stage::Ready(_) => 0,
        }
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn settings(&self) -> EnforcementSettings {
        self.settings
    }

    pub fn is_work_ticking(&self) -> bool {
        matches!(self.stage, Stage::Work(_))
    }

    pub fn break_active(&self) -> Option<&BreakEnforcement> {
        match &self.stage {
            Stage::Break(b) => Some(b),
            _ => None,
        }
    }

    pub fn ready_gate_active(&self) -> bool {
        matches!(self.stage, Stage::Ready(_))
    }

    /// Deadline of the pending one-shot arming timer, if an overlay is up and
    /// not yet armed.
    pub fn next_arm_at(&self) -> Option<DateTime<Utc>> {
        match &self.stage {
            Stage::Break(b) => b.arm_due(),
            Stage::Ready(g) => g.arm_due(),
            _ => None,
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            phase: self.phase(),
            affordance: self.affordance(),
            ready_gate: self.ready_gate_active(),
            punished: self.break_active().is_some_and(|b| b.is_punished(now)),
            seconds_remaining: self.seconds_remaining(),
            total_secs: self.total_secs(),
            work_secs: self.durations.work_secs(),
            break_secs: self.durations.break_secs(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The start/pause/resume toggle.
    ///
    /// No-op while a break or the ready gate is up: breaks cannot be paused.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match std::mem::take(&mut self.stage) {
            Stage::Idle => Some(self.begin_work(now)),
            Stage::Work(w) => {
                self.stage = Stage::Paused(w);
                info!(remaining_secs = w.seconds_remaining, "work paused");
                Some(Event::WorkPaused {
                    remaining_secs: w.seconds_remaining,
                    at: now,
                })
            }
            Stage::Paused(mut w) => {
                // Re-anchor so the paused interval is not read as a sleep gap.
                w.last_tick = now;
                self.stage = Stage::Work(w);
                info!(remaining_secs = w.seconds_remaining, "work resumed");
                Some(Event::WorkResumed {
                    remaining_secs: w.seconds_remaining,
                    at: now,
                })
            }
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// Cancel everything and return to idle. Active overlays are torn down
    /// without reporting completion or skip.
    pub fn stop(
        &mut self,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> Option<Event> {
        match std::mem::take(&mut self.stage) {
            Stage::Idle => None,
            Stage::Work(_) | Stage::Paused(_) => Some(self.stopped(now)),
            Stage::Break(b) => {
                b.dismiss(overlay, input);
                Some(self.stopped(now))
            }
            Stage::Ready(g) => {
                g.dismiss(overlay, input);
                Some(self.stopped(now))
            }
        }
    }

    /// One clock tick. Routed to whichever stage is live.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> Option<Event> {
        match std::mem::take(&mut self.stage) {
            Stage::Work(mut w) => {
                let gap = now - w.last_tick;
                w.last_tick = now;
                if self.is_sleep_gap(gap) {
                    return Some(self.restart_after_gap(gap, Phase::Work, now));
                }
                w.seconds_remaining = w.seconds_remaining.saturating_sub(1);
                if w.seconds_remaining > 0 {
                    self.stage = Stage::Work(w);
                    return None;
                }
                let duration_secs = self.durations.break_secs();
                let b = BreakEnforcement::show(duration_secs, now, self.settings, overlay);
                self.stage = Stage::Break(b);
                Some(Event::BreakStarted {
                    duration_secs,
                    at: now,
                })
            }
            Stage::Break(b) => {
                let gap = now - b.last_tick();
                if self.is_sleep_gap(gap) {
                    b.dismiss(overlay, input);
                    return Some(self.restart_after_gap(gap, Phase::Break, now));
                }
                match b.tick(now, overlay, input) {
                    BreakOutcome::Continue(mut b) => {
                        let event = self.punish_event(&mut b, now);
                        self.stage = Stage::Break(b);
                        event
                    }
                    BreakOutcome::Completed => {
                        self.stage = Stage::Ready(ReadyGate::show(now, self.settings, overlay));
                        Some(Event::BreakCompleted { at: now })
                    }
                    BreakOutcome::Skipped => Some(self.after_skip(0, now)),
                }
            }
            Stage::Ready(mut g) => {
                g.arm(now, input);
                self.stage = Stage::Ready(g);
                None
            }
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// The one-shot arming timer fired.
    pub fn arm(&mut self, now: DateTime<Utc>, input: &mut dyn InputMonitor) -> bool {
        match &mut self.stage {
            Stage::Break(b) => b.arm(now, input),
            Stage::Ready(g) => g.arm(now, input),
            _ => false,
        }
    }

    /// Pointer motion from the input monitor. Dropped unless an armed
    /// overlay is up.
    pub fn pointer_moved(
        &mut self,
        pos: PointerPosition,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> Option<Event> {
        match std::mem::take(&mut self.stage) {
            Stage::Break(mut b) => {
                b.pointer_moved(pos, now, overlay);
                let event = self.punish_event(&mut b, now);
                self.stage = Stage::Break(b);
                event
            }
            Stage::Ready(g) => match g.pointer_moved(overlay, input) {
                GateOutcome::Waiting(g) => {
                    self.stage = Stage::Ready(g);
                    None
                }
                GateOutcome::Dismissed => {
                    let work_secs = self.durations.work_secs();
                    self.stage = Stage::Work(WorkClock::fresh(work_secs, now));
                    info!(work_secs, "work started after ready gate");
                    Some(Event::ReadyGateDismissed { work_secs, at: now })
                }
            },
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// The skip control on the break overlay was pressed.
    pub fn skip_break(
        &mut self,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> Option<Event> {
        match std::mem::take(&mut self.stage) {
            Stage::Break(b) => {
                let remaining_secs = b.seconds_remaining();
                let outcome = b.skip(overlay, input);
                debug_assert!(matches!(outcome, BreakOutcome::Skipped));
                Some(self.after_skip(remaining_secs, now))
            }
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// Change the work length. A running or paused work countdown keeps its
    /// elapsed time.
    pub fn set_work_duration(
        &mut self,
        minutes: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, ValidationError> {
        let new_total = minutes_to_secs("work_minutes", minutes)?;
        self.durations.set_work_secs(new_total);
        let seconds_remaining = match &mut self.stage {
            Stage::Work(w) | Stage::Paused(w) => {
                w.seconds_remaining = rescale_remaining(w.total_secs, w.seconds_remaining, new_total);
                w.total_secs = new_total;
                Some(w.seconds_remaining)
            }
            _ => None,
        };
        info!(minutes, ?seconds_remaining, "work duration changed");
        Ok(Some(Event::DurationChanged {
            kind: DurationKind::Work,
            minutes,
            seconds_remaining,
            at: now,
        }))
    }

    /// Change the break length. An active break keeps its elapsed time and
    /// gets a new deadline.
    pub fn set_break_duration(
        &mut self,
        minutes: u64,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
    ) -> Result<Option<Event>, ValidationError> {
        let new_total = minutes_to_secs("break_minutes", minutes)?;
        self.durations.set_break_secs(new_total);
        let seconds_remaining = match &mut self.stage {
            Stage::Break(b) => {
                b.rescale(new_total, now, overlay);
                Some(b.seconds_remaining())
            }
            _ => None,
        };
        info!(minutes, ?seconds_remaining, "break duration changed");
        Ok(Some(Event::DurationChanged {
            kind: DurationKind::Break,
            minutes,
            seconds_remaining,
            at: now,
        }))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn is_sleep_gap(&self, gap: Duration) -> bool {
        gap >= Duration::seconds(self.durations.break_secs() as i64)
    }

    fn begin_work(&mut self, now: DateTime<Utc>) -> Event {
        let duration_secs = self.durations.work_secs();
        self.stage = Stage::Work(WorkClock::fresh(duration_secs, now));
        info!(duration_secs, "work started");
        Event::WorkStarted { duration_secs, at: now }
    }

    fn restart_after_gap(&mut self, gap: Duration, interrupted: Phase, now: DateTime<Utc>) -> Event {
        let duration_secs = self.durations.work_secs();
        let gap_secs = gap.num_seconds().max(0) as u64;
        self.stage = Stage::Work(WorkClock::fresh(duration_secs, now));
        info!(gap_secs, ?interrupted, "wall-clock gap exceeded break length; restarting work");
        Event::WorkRestarted {
            gap_secs,
            interrupted,
            duration_secs,
            at: now,
        }
    }

    fn after_skip(&mut self, remaining_secs: u64, now: DateTime<Utc>) -> Event {
        let work_secs = self.durations.work_secs();
        self.stage = Stage::Work(WorkClock::fresh(work_secs, now));
        Event::BreakSkipped {
            remaining_secs,
            work_secs,
            at: now,
        }
    }

    fn punish_event(&self, b: &mut BreakEnforcement, now: DateTime<Utc>) -> Option<Event> {
        let trigger = b.take_notice()?;
        let punished_until = b.punished_until()?;
        debug!(?trigger, %punished_until, "punishment window opened");
        Some(Event::BreakPunished {
            trigger,
            punished_until,
            remaining_secs: b.seconds_remaining(),
            at: now,
        })
    }

    fn stopped(&mut self, now: DateTime<Utc>) -> Event {
        self.stage = Stage::Idle;
        info!("session stopped");
        Event::Stopped { at: now }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessOverlay, ManualInput};

    struct Rig {
        session: Session,
        overlay: HeadlessOverlay,
        input: ManualInput,
        now: DateTime<Utc>,
    }

    impl Rig {
        fn new(work_secs: u64, break_secs: u64) -> Self {
            Self {
                session: Session::new(
                    Durations::from_secs(work_secs, break_secs).unwrap(),
                    EnforcementSettings::default(),
                ),
                overlay: HeadlessOverlay::default(),
                input: ManualInput::default(),
                now: Utc::now(),
            }
        }

        fn advance(&mut self, secs: i64) -> Option<Event> {
            self.now += Duration::seconds(secs);
            self.input.set_now(self.now);
            self.session.tick(self.now, &mut self.overlay, &mut self.input)
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut rig = Rig::new(60, 10);
        assert_eq!(rig.session.state(), SessionState::Idle);
        assert_eq!(rig.session.affordance(), Affordance::Start);

        assert!(matches!(rig.session.start(rig.now), Some(Event::WorkStarted { duration_secs: 60, .. })));
        assert_eq!(rig.session.state(), SessionState::Running);
        assert_eq!(rig.session.affordance(), Affordance::Pause);

        assert!(rig.session.start(rig.now).is_some());
        assert_eq!(rig.session.state(), SessionState::Paused);
        assert_eq!(rig.session.affordance(), Affordance::Resume);

        assert!(rig.session.start(rig.now).is_some());
        assert_eq!(rig.session.state(), SessionState::Running);
    }

    #[test]
    fn idle_and_paused_ignore_ticks() {
        let mut rig = Rig::new(60, 10);
        assert!(rig.advance(1).is_none());
        rig.session.start(rig.now);
        rig.advance(1);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.advance(1);
        assert_eq!(rig.session.seconds_remaining(), 59);
    }

    #[test]
    fn long_pause_is_not_a_sleep_gap() {
        let mut rig = Rig::new(60, 10);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.session.start(rig.now);
        rig.now += Duration::seconds(3600);
        rig.session.start(rig.now);
        assert!(rig.advance(1).is_none());
        assert_eq!(rig.session.seconds_remaining(), 58);
    }

    #[test]
    fn break_starts_after_exactly_n_ticks() {
        let mut rig = Rig::new(5, 10);
        rig.session.start(rig.now);
        for _ in 0..4 {
            assert!(rig.advance(1).is_none());
        }
        assert!(matches!(rig.advance(1), Some(Event::BreakStarted { duration_secs: 10, .. })));
        assert_eq!(rig.session.phase(), Some(Phase::Break));
        assert_eq!(rig.session.affordance(), Affordance::Disabled);
        assert!(rig.overlay.is_visible());
    }

    #[test]
    fn start_during_break_is_noop() {
        let mut rig = Rig::new(1, 10);
        rig.session.start(rig.now);
        rig.advance(1);
        assert!(rig.session.start(rig.now).is_none());
        assert!(rig.session.break_active().is_some());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut rig = Rig::new(60, 10);
        assert!(rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input).is_none());
        rig.session.start(rig.now);
        assert!(rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input).is_some());
        assert_eq!(rig.session.state(), SessionState::Idle);
        assert!(rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input).is_none());
    }

    #[test]
    fn stop_during_break_tears_down_silently() {
        let mut rig = Rig::new(1, 10);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.advance(2);
        assert!(rig.input.is_subscribed());
        assert!(matches!(
            rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input),
            Some(Event::Stopped { .. })
        ));
        assert!(!rig.overlay.is_visible());
        assert!(!rig.input.is_subscribed());
        for _ in 0..20 {
            assert!(rig.advance(1).is_none());
        }
        assert!(rig
            .session
            .pointer_moved(PointerPosition::new(99.0, 99.0), rig.now, &mut rig.overlay, &mut rig.input)
            .is_none());
    }

    #[test]
    fn work_sleep_gap_restarts_session() {
        let mut rig = Rig::new(1500, 300);
        rig.session.start(rig.now);
        for _ in 0..100 {
            rig.advance(1);
        }
        match rig.advance(400) {
            Some(Event::WorkRestarted { gap_secs, interrupted, duration_secs, .. }) => {
                assert_eq!(gap_secs, 400);
                assert_eq!(interrupted, Phase::Work);
                assert_eq!(duration_secs, 1500);
            }
            other => panic!("expected restart, got {other:?}"),
        }
        assert_eq!(rig.session.seconds_remaining(), 1500);
        assert!(rig.session.break_active().is_none());
    }

    #[test]
    fn gap_just_under_break_counts_as_one_tick() {
        let mut rig = Rig::new(1500, 300);
        rig.session.start(rig.now);
        assert!(rig.advance(299).is_none());
        assert_eq!(rig.session.seconds_remaining(), 1499);
    }

    #[test]
    fn break_sleep_gap_restarts_session() {
        let mut rig = Rig::new(1, 60);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.advance(2);
        assert!(matches!(
            rig.advance(120),
            Some(Event::WorkRestarted { interrupted: Phase::Break, .. })
        ));
        assert!(!rig.overlay.is_visible());
        assert!(!rig.input.is_subscribed());
        assert!(rig.session.is_work_ticking());
    }

    #[test]
    fn set_work_duration_rescales_running_session() {
        let mut rig = Rig::new(1500, 300);
        rig.session.start(rig.now);
        for _ in 0..300 {
            rig.advance(1);
        }
        rig.session.set_work_duration(30, rig.now).unwrap();
        assert_eq!(rig.session.seconds_remaining(), 1500);
        rig.session.set_work_duration(25, rig.now).unwrap();
        assert_eq!(rig.session.seconds_remaining(), 1200);
    }

    #[test]
    fn set_work_duration_clamps_at_zero() {
        let mut rig = Rig::new(1500, 300);
        rig.session.start(rig.now);
        for _ in 0..300 {
            rig.advance(1);
        }
        rig.session.start(rig.now);
        let event = rig.session.set_work_duration(1, rig.now).unwrap();
        assert!(matches!(
            event,
            Some(Event::DurationChanged { seconds_remaining: Some(0), .. })
        ));
        assert_eq!(rig.session.state(), SessionState::Paused);
    }

    #[test]
    fn set_duration_rejects_zero() {
        let mut rig = Rig::new(1500, 300);
        assert!(rig.session.set_work_duration(0, rig.now).is_err());
        assert!(rig
            .session
            .set_break_duration(0, rig.now, &mut rig.overlay)
            .is_err());
        assert_eq!(rig.session.durations(), Durations::from_secs(1500, 300).unwrap());
    }

    #[test]
    fn set_duration_rejects_overlong_values() {
        let mut rig = Rig::new(1, 300);
        rig.session.start(rig.now);
        rig.advance(1);
        assert!(matches!(
            rig.session.set_break_duration(200_000_000_000_000, rig.now, &mut rig.overlay),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(rig.session.set_work_duration(u64::MAX, rig.now).is_err());
        assert_eq!(rig.session.durations(), Durations::from_secs(1, 300).unwrap());
        assert!(rig.advance(1).is_none());
        assert_eq!(rig.session.seconds_remaining(), 299);
    }

    #[test]
    fn stop_mid_punishment_is_silent() {
        let mut rig = Rig::new(1, 10);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.advance(2);
        let pos = rig.input.move_pointer_by(20.0, 0.0);
        assert!(matches!(
            rig.session.pointer_moved(pos, rig.now, &mut rig.overlay, &mut rig.input),
            Some(Event::BreakPunished { .. })
        ));
        assert!(rig.overlay.is_alert());

        assert!(matches!(
            rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input),
            Some(Event::Stopped { .. })
        ));
        assert!(!rig.overlay.is_visible());
        assert!(!rig.input.is_subscribed());
        for _ in 0..20 {
            assert!(rig.advance(1).is_none());
        }
        assert_eq!(rig.session.state(), SessionState::Idle);
    }

    #[test]
    fn stop_during_ready_gate_is_silent() {
        let mut rig = Rig::new(1, 2);
        rig.session.start(rig.now);
        rig.advance(1);
        rig.advance(1);
        assert!(matches!(rig.advance(1), Some(Event::BreakCompleted { .. })));
        assert!(rig.session.ready_gate_active());
        rig.advance(2);
        assert!(rig.input.is_subscribed());

        assert!(matches!(
            rig.session.stop(rig.now, &mut rig.overlay, &mut rig.input),
            Some(Event::Stopped { .. })
        ));
        assert!(!rig.session.ready_gate_active());
        assert!(!rig.overlay.is_visible());
        assert!(!rig.input.is_subscribed());
        let pos = rig.input.move_pointer_by(50.0, 50.0);
        assert!(rig
            .session
            .pointer_moved(pos, rig.now, &mut rig.overlay, &mut rig.input)
            .is_none());
        for _ in 0..10 {
            assert!(rig.advance(1).is_none());
        }
    }

    #[test]
    fn idle_duration_change_applies_to_next_session() {
        let mut rig = Rig::new(1500, 300);
        rig.session.set_work_duration(45, rig.now).unwrap();
        rig.session.start(rig.now);
        assert_eq!(rig.session.seconds_remaining(), 45 * 60);
    }

    #[test]
    fn set_break_duration_rescales_active_break() {
        let mut rig = Rig::new(1, 300);
        rig.session.start(rig.now);
        rig.advance(1);
        for _ in 0..60 {
            rig.advance(1);
        }
        assert_eq!(rig.session.seconds_remaining(), 240);
        rig.session
            .set_break_duration(10, rig.now, &mut rig.overlay)
            .unwrap();
        assert_eq!(rig.session.seconds_remaining(), 540);
        let deadline = rig.session.break_active().map(|b| b.deadline());
        assert_eq!(deadline, Some(rig.now + Duration::seconds(540)));
    }

    #[test]
    fn no_arm_deadline_outside_overlays() {
        let mut rig = Rig::new(1, 300);
        assert!(rig.session.next_arm_at().is_none());
        rig.session.start(rig.now);
        assert!(rig.session.next_arm_at().is_none());
        rig.advance(1);
        assert_eq!(
            rig.session.next_arm_at(),
            Some(rig.now + Duration::milliseconds(1_500))
        );
    }

    #[test]
    fn snapshot_reports_current_state() {
        let rig = Rig::new(1500, 300);
        match rig.session.snapshot(rig.now) {
            Event::StateSnapshot {
                state,
                phase,
                affordance,
                seconds_remaining,
                work_secs,
                ..
            } => {
                assert_eq!(state, SessionState::Idle);
                assert_eq!(phase, None);
                assert_eq!(affordance, Affordance::Start);
                assert_eq!(seconds_remaining, 0);
                assert_eq!(work_secs, 1500);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
