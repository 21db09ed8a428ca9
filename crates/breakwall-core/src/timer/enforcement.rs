//! Break enforcement.
//!
//! Keeps one break on screen until its countdown runs out. The countdown is
//! anchored to an absolute deadline that is re-derived on every tick, so a
//! late or skipped tick never causes drift. Any user activity during the
//! break opens a punishment window in which elapsed time is added back onto
//! the deadline: the displayed countdown freezes and the real break grows.
//!
//! ## Lifetime
//!
//! ```text
//! show -> (tick | pointer)* -> Completed | Skipped | dismissed
//! ```
//!
//! Every method that ends a break takes `self` by value, so a break can report
//! at most one outcome and nothing can reach it after teardown.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::settings::EnforcementSettings;
use crate::clock::whole_secs_until;
use crate::input::{InputMonitor, MotionFilter, PointerPosition};
use crate::overlay::{format_countdown, log_failure, OverlayStyle, OverlaySurface};

/// What opened a punishment window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunishTrigger {
    Keyboard,
    Pointer,
}

/// Result of driving a break forward.
#[derive(Debug)]
pub enum BreakOutcome {
    /// Still running; hand the controller back to the owner.
    Continue(BreakEnforcement),
    /// Countdown reached zero with no punishment active. Resources are
    /// already released.
    Completed,
    /// The user pressed the skip control. Resources are already released.
    Skipped,
}

#[derive(Debug)]
pub struct BreakEnforcement {
    settings: EnforcementSettings,
    total_secs: u64,
    deadline: DateTime<Utc>,
    seconds_remaining: u64,
    last_tick: DateTime<Utc>,
    punished_until: Option<DateTime<Utc>>,
    arm_at: DateTime<Utc>,
    armed: bool,
    motion: MotionFilter,
    alert: bool,
    notice: Option<PunishTrigger>,
}

impl BreakEnforcement {
    /// Put the break overlay up and schedule arming.
    pub fn show(
        duration_secs: u64,
        now: DateTime<Utc>,
        settings: EnforcementSettings,
        overlay: &mut dyn OverlaySurface,
    ) -> Self {
        log_failure(
            "show",
            overlay.show(OverlayStyle::Break, &format_countdown(duration_secs)),
        );
        info!(duration_secs, "break started");
        Self {
            settings,
            total_secs: duration_secs,
            deadline: now + Duration::seconds(duration_secs as i64),
            seconds_remaining: duration_secs,
            last_tick: now,
            punished_until: None,
            arm_at: now + settings.arm_delay(),
            armed: false,
            motion: MotionFilter::new(settings.pointer_threshold),
            alert: false,
            notice: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn last_tick(&self) -> DateTime<Utc> {
        self.last_tick
    }

    pub fn punished_until(&self) -> Option<DateTime<Utc>> {
        self.punished_until
    }

    pub fn is_punished(&self, now: DateTime<Utc>) -> bool {
        self.punished_until.is_some_and(|until| now < until)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// When the pending arming timer should fire, if it has not yet.
    pub fn arm_due(&self) -> Option<DateTime<Utc>> {
        (!self.armed).then_some(self.arm_at)
    }

    /// Drain the punishment that was opened since the last call, if any.
    pub fn take_notice(&mut self) -> Option<PunishTrigger> {
        self.notice.take()
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Start pointer monitoring once the grace delay has passed. Returns
    /// whether this call armed the controller.
    pub fn arm(&mut self, now: DateTime<Utc>, input: &mut dyn InputMonitor) -> bool {
        if self.armed || now < self.arm_at {
            return false;
        }
        if let Err(e) = input.subscribe_pointer() {
            warn!(error = %e, "pointer subscription failed; break relies on keyboard only");
        }
        self.motion.reset(input.pointer_position());
        self.armed = true;
        debug!("break overlay armed");
        true
    }

    /// Pointer motion delivered by the host. Ignored before arming.
    pub fn pointer_moved(
        &mut self,
        pos: PointerPosition,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
    ) {
        if !self.armed {
            return;
        }
        if self.motion.observe(pos) {
            self.punish(now, PunishTrigger::Pointer, overlay);
        }
    }

    pub fn tick(
        mut self,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> BreakOutcome {
        self.arm(now, input);

        let elapsed = (now - self.last_tick).max(Duration::zero());
        self.last_tick = now;

        if input.seconds_since_last_keystroke() < self.settings.keystroke_window_secs {
            self.punish(now, PunishTrigger::Keyboard, overlay);
        }

        if self.is_punished(now) {
            self.deadline += elapsed;
            return BreakOutcome::Continue(self);
        }

        if self.alert {
            log_failure("set_alert", overlay.set_alert(false));
            self.alert = false;
        }
        self.seconds_remaining = whole_secs_until(now, self.deadline);
        log_failure(
            "update_text",
            overlay.update_text(&format_countdown(self.seconds_remaining)),
        );

        if self.seconds_remaining == 0 {
            self.teardown(overlay, input);
            info!("break completed");
            return BreakOutcome::Completed;
        }
        BreakOutcome::Continue(self)
    }

    /// Explicit skip from the on-screen control. Bypasses punishment.
    pub fn skip(
        self,
        overlay: &mut dyn OverlaySurface,
        input: &mut dyn InputMonitor,
    ) -> BreakOutcome {
        info!(
            seconds_remaining = self.seconds_remaining,
            "break skipped"
        );
        self.teardown(overlay, input);
        BreakOutcome::Skipped
    }

    /// Forced silent teardown.
    pub fn dismiss(self, overlay: &mut dyn OverlaySurface, input: &mut dyn InputMonitor) {
        debug!("break dismissed");
        self.teardown(overlay, input);
    }

    /// Keep the elapsed share of the break when its length changes.
    pub fn rescale(
        &mut self,
        new_total_secs: u64,
        now: DateTime<Utc>,
        overlay: &mut dyn OverlaySurface,
    ) {
        self.seconds_remaining = rescale_remaining(self.total_secs, self.seconds_remaining, new_total_secs);
        self.total_secs = new_total_secs;
        self.deadline = now + Duration::seconds(self.seconds_remaining as i64);
        log_failure(
            "update_text",
            overlay.update_text(&format_countdown(self.seconds_remaining)),
        );
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn punish(&mut self, now: DateTime<Utc>, trigger: PunishTrigger, overlay: &mut dyn OverlaySurface) {
        if !self.is_punished(now) {
            debug!(?trigger, "break punished");
            self.notice = Some(trigger);
        }
        self.punished_until = Some(now + self.settings.punishment());
        if !self.alert {
            log_failure("set_alert", overlay.set_alert(true));
            self.alert = true;
        }
    }

    fn teardown(mut self, overlay: &mut dyn OverlaySurface, input: &mut dyn InputMonitor) {
        if self.armed {
            if let Err(e) = input.unsubscribe_pointer() {
                warn!(error = %e, "pointer unsubscribe failed during break teardown");
            }
            self.armed = false;
        }
        log_failure("hide", overlay.hide());
    }
}

/// `max(0, new_total - (old_total - remaining))`.
pub fn rescale_remaining(old_total: u64, remaining: u64, new_total: u64) -> u64 {
    let elapsed = old_total.saturating_sub(remaining);
    new_total.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessOverlay, ManualInput, OverlayCall};

    fn start(secs: u64) -> (BreakEnforcement, HeadlessOverlay, ManualInput, DateTime<Utc>) {
        let mut overlay = HeadlessOverlay::default();
        let input = ManualInput::default();
        let t0 = Utc::now();
        let b = BreakEnforcement::show(secs, t0, EnforcementSettings::default(), &mut overlay);
        (b, overlay, input, t0)
    }

    fn tick(
        b: BreakEnforcement,
        at: DateTime<Utc>,
        overlay: &mut HeadlessOverlay,
        input: &mut ManualInput,
    ) -> BreakEnforcement {
        match b.tick(at, overlay, input) {
            BreakOutcome::Continue(b) => b,
            other => panic!("expected break to continue, got {other:?}"),
        }
    }

    #[test]
    fn rescale_preserves_elapsed() {
        assert_eq!(rescale_remaining(1500, 1200, 1800), 1500);
        assert_eq!(rescale_remaining(1500, 1200, 200), 0);
        assert_eq!(rescale_remaining(300, 300, 600), 600);
    }

    #[test]
    fn show_displays_full_countdown() {
        let (b, overlay, _, _) = start(300);
        assert_eq!(b.seconds_remaining(), 300);
        assert_eq!(
            overlay.calls(),
            &[OverlayCall::Show(OverlayStyle::Break, "05:00".into())]
        );
        assert!(overlay.is_visible());
    }

    #[test]
    fn countdown_follows_deadline_not_tick_count() {
        let (b, mut overlay, mut input, t0) = start(60);
        let b = tick(b, t0 + Duration::seconds(1), &mut overlay, &mut input);
        assert_eq!(b.seconds_remaining(), 59);
        // A late tick catches up in one step.
        let b = tick(b, t0 + Duration::seconds(10), &mut overlay, &mut input);
        assert_eq!(b.seconds_remaining(), 50);
    }

    #[test]
    fn pointer_before_arming_is_ignored() {
        let (mut b, mut overlay, _, t0) = start(60);
        b.pointer_moved(PointerPosition::new(500.0, 500.0), t0, &mut overlay);
        b.pointer_moved(PointerPosition::new(0.0, 0.0), t0 + Duration::milliseconds(100), &mut overlay);
        assert!(b.punished_until().is_none());
        assert!(!b.is_armed());
    }

    #[test]
    fn arming_waits_for_grace_delay() {
        let (mut b, _, mut input, t0) = start(60);
        assert!(!b.arm(t0 + Duration::milliseconds(1_499), &mut input));
        assert!(b.arm(t0 + Duration::milliseconds(1_500), &mut input));
        assert!(input.is_subscribed());
        assert!(b.arm_due().is_none());
        assert!(!b.arm(t0 + Duration::seconds(2), &mut input));
    }

    #[test]
    fn pointer_motion_freezes_countdown() {
        let (mut b, mut overlay, mut input, t0) = start(60);
        b.arm(t0 + Duration::milliseconds(1_500), &mut input);
        b.pointer_moved(PointerPosition::new(10.0, 0.0), t0 + Duration::seconds(2), &mut overlay);
        assert_eq!(b.take_notice(), Some(PunishTrigger::Pointer));
        assert!(overlay.is_alert());

        let b = tick(b, t0 + Duration::seconds(3), &mut overlay, &mut input);
        let b = tick(b, t0 + Duration::seconds(4), &mut overlay, &mut input);
        assert_eq!(b.seconds_remaining(), 60);
        let b = tick(b, t0 + Duration::seconds(5), &mut overlay, &mut input);
        assert!(!overlay.is_alert());
        // Ticks 3 and 4 pushed the deadline out by the 4s elapsed since show.
        assert_eq!(b.seconds_remaining(), 59);
    }

    #[test]
    fn recent_keystroke_punishes_on_tick() {
        let (b, mut overlay, mut input, t0) = start(60);
        input.press_key(t0 + Duration::milliseconds(800));
        input.set_now(t0 + Duration::seconds(1));
        let mut b = tick(b, t0 + Duration::seconds(1), &mut overlay, &mut input);
        assert_eq!(b.take_notice(), Some(PunishTrigger::Keyboard));
        assert_eq!(b.punished_until(), Some(t0 + Duration::seconds(4)));
        assert_eq!(b.deadline(), t0 + Duration::seconds(61));
    }

    #[test]
    fn repeated_activity_reports_one_notice_per_window() {
        let (mut b, mut overlay, mut input, t0) = start(60);
        b.arm(t0 + Duration::seconds(2), &mut input);
        b.pointer_moved(PointerPosition::new(10.0, 0.0), t0 + Duration::seconds(2), &mut overlay);
        assert!(b.take_notice().is_some());
        b.pointer_moved(PointerPosition::new(20.0, 0.0), t0 + Duration::seconds(3), &mut overlay);
        assert!(b.take_notice().is_none());
        assert_eq!(b.punished_until(), Some(t0 + Duration::seconds(6)));
    }

    #[test]
    fn completes_and_releases_resources() {
        let (mut b, mut overlay, mut input, t0) = start(2);
        b.arm(t0 + Duration::seconds(2), &mut input);
        let outcome = b.tick(t0 + Duration::seconds(2), &mut overlay, &mut input);
        assert!(matches!(outcome, BreakOutcome::Completed));
        assert!(!overlay.is_visible());
        assert!(!input.is_subscribed());
    }

    #[test]
    fn does_not_complete_while_punished() {
        let (mut b, mut overlay, mut input, t0) = start(2);
        b.arm(t0 + Duration::milliseconds(1_500), &mut input);
        b.pointer_moved(PointerPosition::new(50.0, 0.0), t0 + Duration::milliseconds(1_600), &mut overlay);
        let b = tick(b, t0 + Duration::seconds(2), &mut overlay, &mut input);
        assert_eq!(b.deadline(), t0 + Duration::seconds(4));
    }

    #[test]
    fn skip_bypasses_punishment() {
        let (mut b, mut overlay, mut input, t0) = start(120);
        b.arm(t0 + Duration::seconds(2), &mut input);
        b.pointer_moved(PointerPosition::new(50.0, 0.0), t0 + Duration::seconds(2), &mut overlay);
        assert!(matches!(b.skip(&mut overlay, &mut input), BreakOutcome::Skipped));
        assert!(!overlay.is_visible());
        assert!(!input.is_subscribed());
    }

    #[test]
    fn dismiss_before_arming_never_subscribes() {
        let (b, mut overlay, mut input, _) = start(120);
        b.dismiss(&mut overlay, &mut input);
        assert_eq!(input.subscribe_count(), 0);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn teardown_failure_is_swallowed() {
        let (b, mut overlay, mut input, t0) = start(1);
        overlay.fail_next_hide();
        let outcome = b.tick(t0 + Duration::seconds(1), &mut overlay, &mut input);
        assert!(matches!(outcome, BreakOutcome::Completed));
    }

    #[test]
    fn rescale_moves_deadline() {
        let (b, mut overlay, mut input, t0) = start(300);
        let now = t0 + Duration::seconds(100);
        let mut b = tick(b, now, &mut overlay, &mut input);
        assert_eq!(b.seconds_remaining(), 200);
        b.rescale(600, now, &mut overlay);
        assert_eq!(b.seconds_remaining(), 500);
        assert_eq!(b.deadline(), now + Duration::seconds(500));
        assert_eq!(overlay.text(), Some("08:20"));
    }
}
