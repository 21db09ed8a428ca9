use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_WORK_MINUTES: u64 = 25;
pub const DEFAULT_BREAK_MINUTES: u64 = 5;

/// Seconds the break countdown is frozen after detected activity.
pub const PUNISHMENT_SECONDS: u64 = 3;
/// Delay between an overlay appearing and input monitoring starting.
pub const ARM_DELAY_MS: u64 = 1_500;
/// Pointer displacement (either axis) below which motion is sensor noise.
pub const POINTER_THRESHOLD: f64 = 3.0;
/// A key press this recent counts as activity on a break tick.
pub const KEYSTROKE_WINDOW_SECS: f64 = 1.0;

/// Longest accepted work or break length: one day.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;
/// Longest accepted punishment window.
pub const MAX_PUNISHMENT_SECS: u64 = 60 * 60;
/// Longest accepted arming delay.
pub const MAX_ARM_DELAY_MS: u64 = 60_000;

/// Work/break lengths in seconds. Both are always positive and at most
/// [`MAX_DURATION_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    work_secs: u64,
    break_secs: u64,
}

impl Durations {
    pub fn from_minutes(work_minutes: u64, break_minutes: u64) -> Result<Self, ValidationError> {
        Self::from_secs(
            minutes_to_secs("work_minutes", work_minutes)?,
            minutes_to_secs("break_minutes", break_minutes)?,
        )
    }

    pub fn from_secs(work_secs: u64, break_secs: u64) -> Result<Self, ValidationError> {
        if work_secs == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "work_secs".into(),
            });
        }
        if break_secs == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "break_secs".into(),
            });
        }
        check_max("work_secs", work_secs, MAX_DURATION_SECS)?;
        check_max("break_secs", break_secs, MAX_DURATION_SECS)?;
        Ok(Self {
            work_secs,
            break_secs,
        })
    }

    pub fn work_secs(&self) -> u64 {
        self.work_secs
    }

    pub fn break_secs(&self) -> u64 {
        self.break_secs
    }

    pub(crate) fn set_work_secs(&mut self, secs: u64) {
        self.work_secs = secs;
    }

    pub(crate) fn set_break_secs(&mut self, secs: u64) {
        self.break_secs = secs;
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_MINUTES * 60,
            break_secs: DEFAULT_BREAK_MINUTES * 60,
        }
    }
}

/// Convert a user-facing minute count, rejecting zero and anything longer
/// than [`MAX_DURATION_SECS`].
pub(crate) fn minutes_to_secs(field: &str, minutes: u64) -> Result<u64, ValidationError> {
    if minutes == 0 {
        return Err(ValidationError::ZeroDuration {
            field: field.to_string(),
        });
    }
    check_max(field, minutes, MAX_DURATION_SECS / 60)?;
    Ok(minutes * 60)
}

fn check_max(field: &str, value: u64, max: u64) -> Result<(), ValidationError> {
    if value > max {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("must be at most {max}"),
        });
    }
    Ok(())
}

/// Tuning for break enforcement and the ready gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnforcementSettings {
    pub punishment_secs: u64,
    pub arm_delay_ms: u64,
    pub pointer_threshold: f64,
    pub keystroke_window_secs: f64,
}

impl Default for EnforcementSettings {
    fn default() -> Self {
        Self {
            punishment_secs: PUNISHMENT_SECONDS,
            arm_delay_ms: ARM_DELAY_MS,
            pointer_threshold: POINTER_THRESHOLD,
            keystroke_window_secs: KEYSTROKE_WINDOW_SECS,
        }
    }
}

impl EnforcementSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.punishment_secs == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "punishment_secs".into(),
            });
        }
        check_max("punishment_secs", self.punishment_secs, MAX_PUNISHMENT_SECS)?;
        check_max("arm_delay_ms", self.arm_delay_ms, MAX_ARM_DELAY_MS)?;
        let non_negative = |field: &str, value: f64| {
            if value.is_nan() || value < 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be zero or positive".into(),
                });
            }
            Ok(())
        };
        non_negative("pointer_threshold", self.pointer_threshold)?;
        non_negative("keystroke_window_secs", self.keystroke_window_secs)
    }

    /// Clamped to [`MAX_PUNISHMENT_SECS`].
    pub fn punishment(&self) -> Duration {
        Duration::seconds(self.punishment_secs.min(MAX_PUNISHMENT_SECS) as i64)
    }

    /// Clamped to [`MAX_ARM_DELAY_MS`].
    pub fn arm_delay(&self) -> Duration {
        Duration::milliseconds(self.arm_delay_ms.min(MAX_ARM_DELAY_MS) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_minutes_rejected() {
        assert_eq!(
            Durations::from_minutes(0, 5),
            Err(ValidationError::ZeroDuration {
                field: "work_minutes".into()
            })
        );
        assert!(Durations::from_minutes(25, 0).is_err());
    }

    #[test]
    fn overlong_durations_rejected() {
        assert!(Durations::from_minutes(24 * 60, 24 * 60).is_ok());
        assert!(matches!(
            Durations::from_minutes(25, 200_000_000_000_000),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(Durations::from_minutes(u64::MAX, 5).is_err());
        assert!(Durations::from_secs(MAX_DURATION_SECS + 1, 300).is_err());
    }

    #[test]
    fn enforcement_settings_bounds() {
        assert!(EnforcementSettings::default().validate().is_ok());
        let huge = EnforcementSettings {
            punishment_secs: u64::MAX,
            arm_delay_ms: u64::MAX,
            ..EnforcementSettings::default()
        };
        assert!(huge.validate().is_err());
        assert_eq!(huge.punishment(), Duration::seconds(MAX_PUNISHMENT_SECS as i64));
        assert_eq!(huge.arm_delay(), Duration::milliseconds(MAX_ARM_DELAY_MS as i64));
    }

    #[test]
    fn defaults_are_25_and_5() {
        let d = Durations::default();
        assert_eq!(d.work_secs(), 1500);
        assert_eq!(d.break_secs(), 300);
    }
}
