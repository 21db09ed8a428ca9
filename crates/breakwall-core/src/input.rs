//! Input monitor contract and pointer jitter filtering.
//!
//! The host reports user activity system-wide. Keyboard activity is polled
//! (`seconds_since_last_keystroke`) once per tick; pointer motion arrives as
//! discrete events through the runtime while a subscription is open.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Global pointer location in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait InputMonitor {
    /// Seconds since the last key press anywhere on the system.
    fn seconds_since_last_keystroke(&self) -> f64;

    /// Current global pointer location.
    fn pointer_position(&self) -> PointerPosition;

    /// Start delivering pointer-motion events.
    fn subscribe_pointer(&mut self) -> Result<(), InputError>;

    /// Stop delivering pointer-motion events. Must take effect before
    /// returning.
    fn unsubscribe_pointer(&mut self) -> Result<(), InputError>;
}

/// Drops pointer motion below a jitter threshold.
///
/// Compares each sample against the previous one, not against an anchor, so
/// the reference point follows the pointer.
#[derive(Debug, Clone)]
pub struct MotionFilter {
    threshold: f64,
    last: Option<PointerPosition>,
}

impl MotionFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    /// Seed the reference sample without judging it.
    pub fn reset(&mut self, at: PointerPosition) {
        self.last = Some(at);
    }

    /// Record a sample. Returns `true` if it moved beyond the threshold in
    /// either axis since the previous sample.
    pub fn observe(&mut self, pos: PointerPosition) -> bool {
        let moved = match self.last {
            Some(prev) => {
                (pos.x - prev.x).abs() > self.threshold || (pos.y - prev.y).abs() > self.threshold
            }
            None => false,
        };
        self.last = Some(pos);
        moved
    }
}
