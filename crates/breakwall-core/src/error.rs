//! Core error types for breakwall-core.
//!
//! The state machine itself never fails: anomalies such as sleep gaps are
//! modelled as transitions. Errors only arise at the edges: configuration and
//! argument validation. Failures reported by the host collaborators behind
//! [`OverlaySurface`](crate::overlay::OverlaySurface) and
//! [`InputMonitor`](crate::input::InputMonitor) are logged and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breakwall-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Durations must be strictly positive
    #[error("'{field}' must be greater than zero")]
    ZeroDuration { field: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failures reported by the host overlay implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    #[error("failed to show overlay: {0}")]
    ShowFailed(String),

    #[error("failed to update overlay: {0}")]
    UpdateFailed(String),

    #[error("failed to hide overlay: {0}")]
    HideFailed(String),
}

/// Failures reported by the host input monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("failed to subscribe to pointer events: {0}")]
    SubscribeFailed(String),

    #[error("failed to unsubscribe from pointer events: {0}")]
    UnsubscribeFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
