use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Affordance, DurationKind, Phase, PunishTrigger, SessionState};

/// Every state change in the session produces an Event.
/// Hosts render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    WorkStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    WorkPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    WorkResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A wall-clock gap at least as long as the break (sleep, clock change)
    /// abandoned the cycle; a fresh work session started instead.
    WorkRestarted {
        gap_secs: u64,
        interrupted: Phase,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Activity opened a punishment window; the countdown is frozen until
    /// `punished_until`.
    BreakPunished {
        trigger: PunishTrigger,
        punished_until: DateTime<Utc>,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Break ran out; the ready gate is now up.
    BreakCompleted {
        at: DateTime<Utc>,
    },
    /// Break skipped via the on-screen control; work restarted.
    BreakSkipped {
        remaining_secs: u64,
        work_secs: u64,
        at: DateTime<Utc>,
    },
    /// Ready gate passed; work restarted.
    ReadyGateDismissed {
        work_secs: u64,
        at: DateTime<Utc>,
    },
    Stopped {
        at: DateTime<Utc>,
    },
    DurationChanged {
        kind: DurationKind,
        minutes: u64,
        /// Remaining seconds of the rescaled countdown, if one was running.
        seconds_remaining: Option<u64>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        phase: Option<Phase>,
        affordance: Affordance,
        ready_gate: bool,
        punished: bool,
        seconds_remaining: u64,
        total_secs: u64,
        work_secs: u64,
        break_secs: u64,
        at: DateTime<Utc>,
    },
}
