//! Ready gate - hold the next work session until the user is back.
//!
//! After a break runs out the screen stays tinted until the pointer moves.
//! This keeps a new work session from silently starting while the user is
//! still away. There is no countdown and no punishment: once armed, any
//! pointer motion ends the gate.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::settings::EnforcementSettings;
use crate::input::InputMonitor;
use crate::overlay::{format_countdown, log_failure, OverlayStyle, OverlaySurface};

#[derive(Debug)]
pub enum GateOutcome {
    Waiting(ReadyGate),
    /// The user came back. Resources are already released.
    Dismissed,
}

#[derive(Debug)]
pub struct ReadyGate {
    arm_at: DateTime<Utc>,
    armed: bool,
}

impl ReadyGate {
    pub fn show(
        now: DateTime<Utc>,
        settings: EnforcementSettings,
        overlay: &mut dyn OverlaySurface,
    ) -> Self {
        log_failure("show", overlay.show(OverlayStyle::Ready, &format_countdown(0)));
        info!("ready gate shown");
        Self {
            arm_at: now + settings.arm_delay(),
            armed: false,
        }
    }

    pub fn arm_due(&self) -> Option<DateTime<Utc>> {
        (!self.armed).then_some(self.arm_at)
    }

    pub fn arm(&mut self, now: DateTime<Utc>, input: &mut dyn InputMonitor) -> bool {
        if self.armed || now < self.arm_at {
            return false;
        }
        if let Err(e) = input.subscribe_pointer() {
            warn!(error = %e, "pointer subscription failed; ready gate cannot be dismissed by motion");
        }
        self.armed = true;
        debug!("ready gate armed");
        true
    }

    pub fn pointer_moved(
        self,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> GateOutcome {
        if !self.armed {
            return GateOutcome::Waiting(self);
        }
        info!("ready gate dismissed by user");
        self.teardown(overlay, input);
        GateOutcome::Dismissed
    }

    /// Forced silent teardown.
    pub fn dismiss(self, overlay: &mut dyn OverlaySurface, input: &mut dyn InputMonitor) {
        debug!("ready gate dismissed");
        self.teardown(overlay, input);
    }

    fn teardown(self, overlay: &mut dyn OverlaySurface, input: &mut dyn InputMonitor) {
        if self.armed {
            if let Err(e) = input.unsubscribe_pointer() {
                warn!(error = %e, "pointer unsubscribe failed during ready gate teardown");
            }
        }
        log_failure("hide", overlay.hide());
    }
}
