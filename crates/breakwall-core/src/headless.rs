//! In-memory collaborators.
//!
//! [`HeadlessOverlay`] records every overlay call and [`ManualInput`] is an
//! input monitor whose activity is injected by the caller. Together with
//! [`ManualClock`](crate::clock::ManualClock) they replay a whole session
//! deterministically without a display.

use chrono::{DateTime, Utc};

use crate::error::{InputError, OverlayError};
use crate::input::{InputMonitor, PointerPosition};
use crate::overlay::{OverlayStyle, OverlaySurface};

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    Show(OverlayStyle, String),
    UpdateText(String),
    SetAlert(bool),
    Hide,
}

#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    calls: Vec<OverlayCall>,
    visible: Option<OverlayStyle>,
    text: Option<String>,
    alert: bool,
    fail_next_hide: bool,
}

impl HeadlessOverlay {
    pub fn calls(&self) -> &[OverlayCall] {
        &self.calls
    }

    pub fn is_visible(&self) -> bool {
        self.visible.is_some()
    }

    pub fn style(&self) -> Option<OverlayStyle> {
        self.visible
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_alert(&self) -> bool {
        self.alert
    }

    /// Make the next `hide` report a failure. The overlay still disappears.
    pub fn fail_next_hide(&mut self) {
        self.fail_next_hide = true;
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl OverlaySurface for HeadlessOverlay {
    fn show(&mut self, style: OverlayStyle, text: &str) -> Result<(), OverlayError> {
        self.calls.push(OverlayCall::Show(style, text.to_string()));
        self.visible = Some(style);
        self.text = Some(text.to_string());
        self.alert = false;
        Ok(())
    }

    fn update_text(&mut self, text: &str) -> Result<(), OverlayError> {
        self.calls.push(OverlayCall::UpdateText(text.to_string()));
        self.text = Some(text.to_string());
        Ok(())
    }

    fn set_alert(&mut self, alert: bool) -> Result<(), OverlayError> {
        self.calls.push(OverlayCall::SetAlert(alert));
        self.alert = alert;
        Ok(())
    }

    fn hide(&mut self) -> Result<(), OverlayError> {
        self.calls.push(OverlayCall::Hide);
        self.visible = None;
        self.text = None;
        self.alert = false;
        if std::mem::take(&mut self.fail_next_hide) {
            return Err(OverlayError::HideFailed("injected failure".into()));
        }
        Ok(())
    }
}

/// Input monitor driven by explicit calls.
///
/// Keystroke recency is computed against an injected "now" so it follows the
/// same clock as the session.
#[derive(Debug, Clone, Default)]
pub struct ManualInput {
    now: Option<DateTime<Utc>>,
    last_key: Option<DateTime<Utc>>,
    pointer: PointerPosition,
    subscribed: bool,
    subscribe_count: usize,
}

impl ManualInput {
    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = Some(now);
    }

    pub fn press_key(&mut self, at: DateTime<Utc>) {
        self.last_key = Some(at);
    }

    /// Move the pointer, returning the new position for delivery as an event.
    pub fn move_pointer_to(&mut self, pos: PointerPosition) -> PointerPosition {
        self.pointer = pos;
        pos
    }

    pub fn move_pointer_by(&mut self, dx: f64, dy: f64) -> PointerPosition {
        self.move_pointer_to(PointerPosition::new(self.pointer.x + dx, self.pointer.y + dy))
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count
    }
}

impl InputMonitor for ManualInput {
    fn seconds_since_last_keystroke(&self) -> f64 {
        match (self.last_key, self.now) {
            (Some(key), Some(now)) => (now - key).num_milliseconds().max(0) as f64 / 1000.0,
            _ => f64::MAX,
        }
    }

    fn pointer_position(&self) -> PointerPosition {
        self.pointer
    }

    fn subscribe_pointer(&mut self) -> Result<(), InputError> {
        self.subscribed = true;
        self.subscribe_count += 1;
        Ok(())
    }

    fn unsubscribe_pointer(&mut self) -> Result<(), InputError> {
        self.subscribed = false;
        Ok(())
    }
}
