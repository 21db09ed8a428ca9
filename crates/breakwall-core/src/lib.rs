//! # breakwall Core Library
//!
//! This library provides the core logic for the breakwall break enforcer: a
//! work timer that, when a work session ends, covers every screen until the
//! break is over. Moving the mouse or typing during the break freezes the
//! countdown, so the only way out early is a deliberate skip.
//!
//! ## Architecture
//!
//! - **Session**: A wall-clock-based state machine that requires the caller
//!   to invoke `tick()` once per second and forward input events
//! - **Break Enforcement / Ready Gate**: Controllers owned by the session,
//!   driving an [`OverlaySurface`] supplied by the host
//! - **Runtime**: A single-task tokio loop that multiplexes ticks, arming
//!   timers and host commands
//! - **Storage**: TOML-based configuration
//! - **Simulation**: Deterministic replay on a manual clock
//!
//! ## Key Components
//!
//! - [`Session`]: Core state machine
//! - [`Config`]: Application configuration management
//! - [`OverlaySurface`] / [`InputMonitor`]: Host collaborator contracts

pub mod clock;
pub mod error;
pub mod events;
pub mod headless;
pub mod input;
pub mod overlay;
pub mod runtime;
pub mod simulation;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, InputError, OverlayError, ValidationError};
pub use events::Event;
pub use input::{InputMonitor, MotionFilter, PointerPosition};
pub use overlay::{format_countdown, OverlayStyle, OverlaySurface};
pub use runtime::{Command, EventSink, Runtime};
pub use storage::Config;
pub use timer::{
    Affordance, BreakEnforcement, Durations, EnforcementSettings, Phase, PunishTrigger, ReadyGate,
    Session, SessionState,
};
