//! Overlay surface contract.
//!
//! The host owns every window; the core only decides what is shown and when.
//! Failures are returned so callers can log them, but no transition ever
//! waits on an overlay succeeding.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::OverlayError;

/// Which full-screen overlay to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStyle {
    /// Red tint on every screen, large countdown, and a skip control that
    /// accepts a single press. Tint layers pass clicks through.
    Break,
    /// Green tint on every screen with a static label.
    Ready,
}

pub trait OverlaySurface {
    /// Cover every active display.
    fn show(&mut self, style: OverlayStyle, text: &str) -> Result<(), OverlayError>;

    fn update_text(&mut self, text: &str) -> Result<(), OverlayError>;

    /// Switch the countdown between the normal and alert colour.
    fn set_alert(&mut self, alert: bool) -> Result<(), OverlayError>;

    fn hide(&mut self) -> Result<(), OverlayError>;
}

/// `MM:SS`, minutes unbounded.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Run an overlay call, logging and swallowing its failure.
pub(crate) fn log_failure(op: &str, result: Result<(), OverlayError>) {
    if let Err(e) = result {
        warn!(op, error = %e, "overlay call failed");
    }
}
