//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work and break lengths, and the choices offered for each
//! - Break enforcement tuning (punishment window, pointer jitter, arming delay)
//!
//! Configuration is stored at `~/.config/breakwall/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::timer::{
    Durations, EnforcementSettings, ARM_DELAY_MS, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
    KEYSTROKE_WINDOW_SECS, MAX_DURATION_SECS, POINTER_THRESHOLD, PUNISHMENT_SECONDS,
};

/// Work/break lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    /// Choices offered by the settings menu.
    #[serde(default = "default_work_options")]
    pub work_options: Vec<u64>,
    #[serde(default = "default_break_options")]
    pub break_options: Vec<u64>,
}

/// Break enforcement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementConfig {
    #[serde(default = "default_punishment_secs")]
    pub punishment_secs: u64,
    #[serde(default = "default_pointer_threshold")]
    pub pointer_threshold: f64,
    #[serde(default = "default_arm_delay_ms")]
    pub arm_delay_ms: u64,
    #[serde(default = "default_keystroke_window_secs")]
    pub keystroke_window_secs: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakwall/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub enforcement: EnforcementConfig,
}

// Default functions
fn default_work_minutes() -> u64 {
    DEFAULT_WORK_MINUTES
}
fn default_break_minutes() -> u64 {
    DEFAULT_BREAK_MINUTES
}
fn default_work_options() -> Vec<u64> {
    vec![1, 15, 20, 25, 30, 45, 60]
}
fn default_break_options() -> Vec<u64> {
    vec![1, 3, 5, 10, 15, 20]
}
fn default_punishment_secs() -> u64 {
    PUNISHMENT_SECONDS
}
fn default_pointer_threshold() -> f64 {
    POINTER_THRESHOLD
}
fn default_arm_delay_ms() -> u64 {
    ARM_DELAY_MS
}
fn default_keystroke_window_secs() -> f64 {
    KEYSTROKE_WINDOW_SECS
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            work_options: default_work_options(),
            break_options: default_break_options(),
        }
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            punishment_secs: default_punishment_secs(),
            pointer_threshold: default_pointer_threshold(),
            arm_delay_ms: default_arm_delay_ms(),
            keystroke_window_secs: default_keystroke_window_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory. Rejects unknown keys, unparsable values
    /// and values that fail [`Config::validate`]; on error `self` is untouched.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.durations()?;
        let minutes = |field: &str, values: &[u64]| {
            if values.is_empty() || values.iter().any(|&m| m == 0 || m > MAX_DURATION_SECS / 60) {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!(
                        "must be a non-empty list of minutes between 1 and {}",
                        MAX_DURATION_SECS / 60
                    ),
                });
            }
            Ok(())
        };
        minutes("timer.work_options", &self.timer.work_options)?;
        minutes("timer.break_options", &self.timer.break_options)?;
        self.enforcement_settings().validate()
    }

    pub fn durations(&self) -> Result<Durations, ValidationError> {
        Durations::from_minutes(self.timer.work_minutes, self.timer.break_minutes)
    }

    pub fn enforcement_settings(&self) -> EnforcementSettings {
        EnforcementSettings {
            punishment_secs: self.enforcement.punishment_secs,
            arm_delay_ms: self.enforcement.arm_delay_ms,
            pointer_threshold: self.enforcement.pointer_threshold,
            keystroke_window_secs: self.enforcement.keystroke_window_secs,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
