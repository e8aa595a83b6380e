//! Motion controller for the rotary platform.
//!
//! This module provides [`MotionController`], the state machine that turns
//! high-level demands (move to a position, seek the reference, run
//! continuously) into pulse-source start/stop decisions, while tracking
//! logical position from step-edge feedback.
//!
//! # Overview
//!
//! The controller:
//! - Validates each command against the current motion state
//! - Drives the pulse source exclusively (nothing else may touch it)
//! - Consumes step-edge notifications to count down bounded moves and
//!   track position
//! - Finalizes motions from [`poll`](MotionController::poll): a bounded
//!   move ends when its step budget is exhausted, a reference seek when
//!   the sensor fires
//!
//! # Example
//!
//! ```rust
//! use rotaplate::{MotionController, MotionKind};
//! use rotaplate::hal::{MockDelay, MockPulse, MockReference};
//!
//! let mut controller =
//!     MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap();
//!
//! // Demand an absolute move
//! let outcome = controller.move_to(100.0).unwrap();
//! assert!(outcome.is_accepted());
//! assert_eq!(controller.motion_kind(), MotionKind::MoveTo);
//!
//! // Feed synthetic step edges until the budget is exhausted
//! while controller.pending_steps() > 0 {
//!     controller.on_step_edge();
//! }
//! controller.poll().unwrap();
//! assert_eq!(controller.motion_kind(), MotionKind::Idle);
//! ```
//!
//! # Concurrency
//!
//! The controller itself is not thread-safe: commands and step edges must
//! be serialized by the caller. The `services::runner` module (feature
//! `runtime`) funnels both through one single-consumer channel so that
//! arrival order becomes processing order.

use tracing::{debug, info, warn};

use crate::commands::{CommandOutcome, MotionCommand, RejectReason};
use crate::config::PlatformConfig;
use crate::state::{
    Microstep, MotionKind, MotorState, DEFAULT_REFERENCE_POSITION, DIRECTION_SETTLE_MS, RUN_DUTY,
    SEEK_FREQUENCY_HZ,
};
use crate::traits::{Delay, Direction, PulseSource, ReferenceSensor};

/// Motion controller for a stepper-driven rotary platform.
///
/// Owns the [`MotorState`] and the pulse source; all motion and
/// configuration changes go through this type.
///
/// # Type Parameters
///
/// - `P`: Pulse source implementation ([`PulseSource`] trait)
/// - `R`: Reference sensor implementation ([`ReferenceSensor`] trait)
/// - `D`: Settle delay provider ([`Delay`] trait)
///
/// # Errors
///
/// Operations return `Err` only for pulse-source hardware failures.
/// Validation failures (busy, config locked) are
/// [`CommandOutcome`] values: they are reported to the caller, never
/// escalated.
pub struct MotionController<P: PulseSource, R: ReferenceSensor, D: Delay> {
    pulse: P,
    sensor: R,
    delay: D,
    state: MotorState,
}

impl<P: PulseSource, R: ReferenceSensor, D: Delay> MotionController<P, R, D> {
    /// Create a controller and program the pulse source with the default
    /// configuration (maximal microstep ratio, default frequency, forward
    /// direction).
    ///
    /// # Errors
    ///
    /// Fails if the pulse source cannot be initialized. This is fatal at
    /// startup: the process must not proceed with motion features.
    pub fn new(pulse: P, sensor: R, delay: D) -> Result<Self, P::Error> {
        let state = MotorState::default();
        let mut controller = Self {
            pulse,
            sensor,
            delay,
            state,
        };
        controller
            .pulse
            .set_frequency(controller.state.pulse_frequency_hz)?;
        controller.pulse.set_direction(controller.state.direction)?;
        Ok(controller)
    }

    /// Apply a persisted configuration through the equivalent setters.
    ///
    /// Microstep first (it resets the frequency to the ratio default),
    /// then speed so the loaded RPM wins, then direction. Intended for
    /// startup, while the controller is idle.
    pub fn apply_config(&mut self, config: &PlatformConfig) -> Result<(), P::Error> {
        self.set_microstep(config.microstep)?;
        self.set_speed(f64::from(config.rpm))?;
        self.state.direction = config.direction;
        self.pulse.set_direction(config.direction)?;
        Ok(())
    }

    /// Dispatch a [`MotionCommand`] to the matching operation.
    pub fn apply_command(&mut self, cmd: MotionCommand) -> Result<CommandOutcome, P::Error> {
        match cmd {
            MotionCommand::MoveTo(target) => self.move_to(target),
            MotionCommand::AdvanceOneUnit => self.advance_one_unit(),
            MotionCommand::SeekReference => self.seek_reference(),
            MotionCommand::StartContinuous => self.start_continuous(),
            MotionCommand::Stop => self.stop(),
            MotionCommand::SwitchDirection => self.switch_direction(),
            MotionCommand::SetSpeed(rpm) => self.set_speed(rpm),
            MotionCommand::SetMicrostep(ms) => self.set_microstep(ms),
        }
    }

    // ========================================================================
    // Motion commands
    // ========================================================================

    /// Start a bounded move to an absolute position in degrees.
    ///
    /// Computes the step budget `floor(|target - position| / resolution)`.
    /// A target within one step resolution of the current position is a
    /// successful no-op ([`CommandOutcome::AlreadyAtTarget`]); this keeps
    /// the platform from oscillating at the resolution boundary.
    pub fn move_to(&mut self, target: f64) -> Result<CommandOutcome, P::Error> {
        if self.state.motion_kind.is_active() {
            return Ok(CommandOutcome::Rejected(RejectReason::Busy));
        }

        let resolution = self.state.step_resolution_degrees();
        let delta = target - self.state.position;
        // Truncation is the floor here; delta.abs()/resolution is never
        // negative.
        let steps = (abs(delta) / resolution) as u32;

        if steps == 0 {
            return Ok(CommandOutcome::AlreadyAtTarget);
        }

        let direction = if delta >= 0.0 {
            Direction::Forward
        } else {
            Direction::Backward
        };

        // DIR must be latched before the first pulse; state is committed
        // only once the pulse source accepted the whole sequence
        self.pulse.set_direction(direction)?;
        self.pulse.set_frequency(self.state.pulse_frequency_hz)?;
        self.pulse.enable(RUN_DUTY)?;

        self.state.direction = direction;
        self.state.pending_steps = steps;
        self.state.update_position_on_step = true;
        self.state.motion_kind = MotionKind::MoveTo;

        debug!(target_degrees = target, steps, "move started");
        Ok(CommandOutcome::Applied)
    }

    /// Advance one step-resolution unit beyond the current position in the
    /// current direction.
    pub fn advance_one_unit(&mut self) -> Result<CommandOutcome, P::Error> {
        let step = self.state.direction.sign() * self.state.step_resolution_degrees();
        self.move_to(self.state.position + step)
    }

    /// Run forward slowly until the reference sensor fires.
    ///
    /// Terminates through [`poll`](Self::poll): when the sensor reads
    /// active, the position is reset to
    /// [`DEFAULT_REFERENCE_POSITION`] and the controller returns to idle.
    pub fn seek_reference(&mut self) -> Result<CommandOutcome, P::Error> {
        if self.state.motion_kind.is_active() {
            return Ok(CommandOutcome::Rejected(RejectReason::Busy));
        }

        self.pulse.set_direction(Direction::Forward)?;
        self.pulse.set_frequency(SEEK_FREQUENCY_HZ)?;
        self.pulse.enable(RUN_DUTY)?;

        self.state.direction = Direction::Forward;
        self.state.update_position_on_step = true;
        self.state.motion_kind = MotionKind::SeekReference;

        debug!("reference seek started");
        Ok(CommandOutcome::Applied)
    }

    /// Start a free-running pulse train at the configured speed and
    /// direction.
    ///
    /// Continuous runs do not track position; only bounded moves and
    /// reference seeks update it.
    pub fn start_continuous(&mut self) -> Result<CommandOutcome, P::Error> {
        if self.state.motion_kind.is_active() {
            return Ok(CommandOutcome::Rejected(RejectReason::Busy));
        }

        self.pulse.set_direction(self.state.direction)?;
        self.pulse.set_frequency(self.state.pulse_frequency_hz)?;
        self.pulse.enable(RUN_DUTY)?;

        self.state.update_position_on_step = false;
        self.state.motion_kind = MotionKind::Continuous;

        debug!(hz = self.state.pulse_frequency_hz, "continuous run started");
        Ok(CommandOutcome::Applied)
    }

    /// Stop whatever motion is active. Idempotent.
    ///
    /// A bounded move stopped early keeps the partial position reached so
    /// far; nothing is rolled back.
    pub fn stop(&mut self) -> Result<CommandOutcome, P::Error> {
        if self.state.motion_kind.is_active() {
            self.pulse.disable()?;
            self.clear_motion();
            debug!("motion stopped");
        }
        Ok(CommandOutcome::Applied)
    }

    /// Flip the rotation direction.
    ///
    /// While idle, only the latched DIR level changes. While moving, the
    /// pulse train is disabled, the settle delay elapses so the driver
    /// registers the new level, and the run restarts as a continuous run.
    pub fn switch_direction(&mut self) -> Result<CommandOutcome, P::Error> {
        let direction = self.state.direction.flipped();
        self.state.direction = direction;

        if self.state.motion_kind.is_active() {
            self.pulse.disable()?;
            self.delay.delay_ms(DIRECTION_SETTLE_MS);
            self.pulse.set_direction(direction)?;

            self.state.motion_kind = MotionKind::Continuous;
            self.state.pending_steps = 0;
            self.state.update_position_on_step = false;

            self.pulse.set_frequency(self.state.pulse_frequency_hz)?;
            self.pulse.enable(RUN_DUTY)?;
        } else {
            self.pulse.set_direction(direction)?;
        }

        Ok(CommandOutcome::Applied)
    }

    // ========================================================================
    // Configuration commands
    // ========================================================================

    /// Change the demanded speed in RPM.
    ///
    /// Recomputes the pulse frequency for the current microstep ratio.
    /// While a continuous run or a bounded move is active the pulse train
    /// is restarted at the new frequency (stop, settle, reconfigure,
    /// re-enable) without disturbing the pending-step count. A reference
    /// seek keeps its fixed slow rate; the new speed takes effect on the
    /// next run.
    ///
    /// RPM bounds are the caller's responsibility; the controller accepts
    /// any positive value.
    pub fn set_speed(&mut self, rpm: f64) -> Result<CommandOutcome, P::Error> {
        let hz = crate::state::frequency_for_rpm(rpm, self.state.microstep);
        self.state.pulse_frequency_hz = hz;

        match self.state.motion_kind {
            MotionKind::Continuous | MotionKind::MoveTo => {
                self.pulse.disable()?;
                self.delay.delay_ms(DIRECTION_SETTLE_MS);
                self.pulse.set_frequency(hz)?;
                self.pulse.enable(RUN_DUTY)?;
            }
            MotionKind::SeekReference | MotionKind::Idle => {}
        }

        debug!(rpm, hz, "speed changed");
        Ok(CommandOutcome::Applied)
    }

    /// Change the driver microstep configuration.
    ///
    /// Rejected while any motion is active: changing the step resolution
    /// mid-move would desynchronize the pending-step count from the
    /// demanded angle. While idle, the step resolution and the
    /// ratio-specific default frequency are recomputed.
    pub fn set_microstep(&mut self, microstep: Microstep) -> Result<CommandOutcome, P::Error> {
        if self.state.motion_kind.is_active() {
            return Ok(CommandOutcome::Rejected(RejectReason::ConfigLocked));
        }

        self.state.microstep = microstep;
        self.state.pulse_frequency_hz = microstep.default_frequency_hz();
        self.pulse.set_frequency(self.state.pulse_frequency_hz)?;

        debug!(
            ratio = microstep.ratio(),
            hz = self.state.pulse_frequency_hz,
            "microstep changed"
        );
        Ok(CommandOutcome::Applied)
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    /// Step-edge notification from the pulse source.
    ///
    /// Called once per physical step. Decrements the pending-step budget
    /// of a bounded move (clamped at zero - an extra pulse is a tolerated
    /// physical reality, not a crash condition) and updates the logical
    /// position for position-tracked motions.
    ///
    /// Must be fast and must run serialized with the command operations;
    /// see the module docs.
    pub fn on_step_edge(&mut self) {
        if self.state.motion_kind == MotionKind::MoveTo {
            if self.state.pending_steps > 0 {
                self.state.pending_steps -= 1;
            } else {
                warn!("step edge with no pending steps, clamping");
            }
        }

        if self.state.update_position_on_step {
            self.state.position +=
                self.state.direction.sign() * self.state.step_resolution_degrees();
        }
    }

    /// Level-triggered motion finalization.
    ///
    /// Call periodically (or after each step edge). Returns `true` when a
    /// motion completed on this call:
    ///
    /// - `SeekReference`: the sensor reads active - pulses stop, position
    ///   resets to [`DEFAULT_REFERENCE_POSITION`], back to idle
    /// - `MoveTo`: the step budget is exhausted - pulses stop, back to
    ///   idle
    pub fn poll(&mut self) -> Result<bool, P::Error> {
        match self.state.motion_kind {
            MotionKind::SeekReference => {
                if self.sensor.is_reference_active() {
                    self.pulse.disable()?;
                    self.state.position = DEFAULT_REFERENCE_POSITION;
                    self.clear_motion();
                    info!(position = DEFAULT_REFERENCE_POSITION, "reference found");
                    return Ok(true);
                }
            }
            MotionKind::MoveTo => {
                if self.state.pending_steps == 0 {
                    self.pulse.disable()?;
                    self.clear_motion();
                    debug!(position = self.state.position, "move complete");
                    return Ok(true);
                }
            }
            MotionKind::Continuous | MotionKind::Idle => {}
        }
        Ok(false)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Snapshot of the current state for the protocol layer.
    pub fn status(&self) -> MotionStatus {
        MotionStatus {
            position_degrees: self.state.position,
            direction: self.state.direction,
            microstep: self.state.microstep,
            rpm: self.state.rpm(),
            motion: self.state.motion_kind,
            pending_steps: self.state.pending_steps,
        }
    }

    /// Current logical position in degrees.
    pub fn position(&self) -> f64 {
        self.state.position
    }

    /// Current (or next-run) direction.
    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    /// Current microstep configuration.
    pub fn microstep(&self) -> Microstep {
        self.state.microstep
    }

    /// Demanded speed in RPM, recovered from the configured frequency.
    pub fn rpm(&self) -> f64 {
        self.state.rpm()
    }

    /// Current motion variant.
    pub fn motion_kind(&self) -> MotionKind {
        self.state.motion_kind
    }

    /// Steps remaining for the active bounded move.
    pub fn pending_steps(&self) -> u32 {
        self.state.pending_steps
    }

    /// True while any motion is active.
    pub fn is_moving(&self) -> bool {
        self.state.motion_kind.is_active()
    }

    /// Disable the pulse source for shutdown.
    pub fn shutdown(&mut self) -> Result<(), P::Error> {
        self.pulse.disable()?;
        self.clear_motion();
        Ok(())
    }

    /// Access the pulse source (for inspection in tests).
    pub fn pulse(&self) -> &P {
        &self.pulse
    }

    /// Mutable access to the reference sensor (for test setups).
    pub fn sensor_mut(&mut self) -> &mut R {
        &mut self.sensor
    }

    /// Access the delay provider (for inspection in tests).
    pub fn delay(&self) -> &D {
        &self.delay
    }

    fn clear_motion(&mut self) {
        self.state.motion_kind = MotionKind::Idle;
        self.state.pending_steps = 0;
        self.state.update_position_on_step = false;
    }
}

// f64::abs is in std, not core; keep the controller no_std-clean.
#[inline]
fn abs(x: f64) -> f64 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}

// ============================================================================
// Status snapshot
// ============================================================================

/// Full state snapshot for the protocol layer.
///
/// Contains everything the remote menu reports. Implements
/// `serde::Serialize` when the `serde` feature is enabled.
///
/// # Example
///
/// ```rust
/// use rotaplate::MotionController;
/// use rotaplate::hal::{MockDelay, MockPulse, MockReference};
///
/// let controller =
///     MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap();
///
/// let status = controller.status();
/// assert_eq!(status.position_degrees, 90.0);
/// assert_eq!(status.pending_steps, 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionStatus {
    /// Logical angular position in degrees.
    pub position_degrees: f64,
    /// Current (or next-run) direction.
    pub direction: Direction,
    /// Driver microstep configuration.
    pub microstep: Microstep,
    /// Demanded speed in RPM.
    pub rpm: f64,
    /// Current motion variant.
    pub motion: MotionKind,
    /// Steps remaining for the active bounded move.
    pub pending_steps: u32,
}

impl MotionStatus {
    /// One-line position/speed summary for the remote menu.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rotaplate::MotionController;
    /// use rotaplate::hal::{MockDelay, MockPulse, MockReference};
    ///
    /// let controller =
    ///     MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap();
    /// let line = controller.status().params_line();
    /// assert_eq!(line.as_str(), "Position: 90 --- Speed (RPM): 18.00");
    /// ```
    pub fn params_line(&self) -> heapless::String<64> {
        use core::fmt::Write;

        let mut line = heapless::String::new();
        let _ = write!(
            line,
            "Position: {} --- Speed (RPM): {:.2}",
            self.position_degrees as i64, self.rpm
        );
        line
    }
}
