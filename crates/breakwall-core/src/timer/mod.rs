mod enforcement;
mod ready_gate;
mod session;
mod settings;

pub use enforcement::{rescale_remaining, BreakEnforcement, BreakOutcome, PunishTrigger};
pub use ready_gate::{GateOutcome, ReadyGate};
pub use session::{Affordance, DurationKind, Phase, Session, SessionState};
pub use settings::{
    Durations, EnforcementSettings, ARM_DELAY_MS, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
    KEYSTROKE_WINDOW_SECS, MAX_ARM_DELAY_MS, MAX_DURATION_SECS, MAX_PUNISHMENT_SECS, POINTER_THRESHOLD,
    PUNISHMENT_SECONDS,
};
