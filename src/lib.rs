//! # rotaplate
//!
//! A motion controller for a stepper-driven rotary platform, with position
//! tracking, reference seeking, and a persisted configuration.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the pulse source, reference
//!   sensor, and settle delays
//! - **Position tracking**: Logical angular position maintained from
//!   step-edge feedback, re-anchored by reference seeks
//! - **Bounded and continuous motion**: Absolute moves with a step budget,
//!   single-unit advances, free-running pulse trains
//! - **Busy protection**: One motion at a time; conflicting demands are
//!   rejected, never queued
//! - **Persisted configuration**: Direction, speed, and microstep setting
//!   survive restarts through a tiny text file
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions and the shared `Direction` enum
//! - `state` - Microstep math, step/frequency/RPM conversions, motor state
//! - `commands` - Command and outcome types for the protocol layer
//! - `controller` - Main motion state machine tying everything together
//! - `config` - The persisted three-line configuration format
//! - `hal` - Concrete implementations (mock for testing)
//! - `services` - Tokio event funnel owning the controller (feature `runtime`)
//!
//! ## Example
//!
//! ```rust
//! use rotaplate::{MotionController, MotionCommand, MotionKind};
//! use rotaplate::hal::{MockDelay, MockPulse, MockReference};
//!
//! // Create controller with mock hardware
//! let mut controller =
//!     MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap();
//!
//! // Demand an absolute move
//! let outcome = controller.apply_command(MotionCommand::MoveTo(120.0)).unwrap();
//! assert!(outcome.is_accepted());
//!
//! // Feed step edges from the hardware notification path
//! while controller.pending_steps() > 0 {
//!     controller.on_step_edge();
//! }
//!
//! // Finalize the move
//! controller.poll().unwrap();
//! assert_eq!(controller.motion_kind(), MotionKind::Idle);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Command and outcome types for the motion controller.
pub mod commands;
/// Persisted platform configuration (three-line text format).
pub mod config;
/// Main motion controller: state machine, step bookkeeping, finalization.
pub mod controller;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Microstep configuration, step/frequency/RPM math, and motor state.
pub mod state;
/// Core traits for hardware abstraction.
pub mod traits;

/// Tokio event funnel owning the controller (feature-gated).
#[cfg(feature = "runtime")]
pub mod services;

// Re-exports for convenience
pub use commands::{CommandOutcome, MotionCommand, RejectReason};
pub use config::PlatformConfig;
pub use controller::{MotionController, MotionStatus};
pub use state::{
    frequency_for_rpm, rpm_for_frequency, Microstep, MotionKind, MotorState,
    DEFAULT_REFERENCE_POSITION, DEFAULT_RPM, DIRECTION_SETTLE_MS, FULL_STEPS_PER_REV, RUN_DUTY,
    SEEK_FREQUENCY_HZ,
};
pub use traits::{Delay, Direction, PulseSource, ReferenceSensor};

#[cfg(feature = "std")]
pub use traits::StdDelay;

#[cfg(feature = "runtime")]
pub use services::{MotionEvent, MotionHandle, MotionRunner, RunnerClosed};
