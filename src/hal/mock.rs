//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without a motor driver attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPulse`] | [`PulseSource`] | Records frequency/duty/direction calls |
//! | [`FailingPulse`] | [`PulseSource`] | Fails after a budget of operations |
//! | [`MockReference`] | [`ReferenceSensor`] | Settable reference level |
//! | [`MockDelay`] | [`Delay`] | Records requested settle delays |
//!
//! # Example
//!
//! ```rust
//! use rotaplate::{MotionController, MotionKind};
//! use rotaplate::hal::{MockDelay, MockPulse, MockReference};
//!
//! // Create controller with mock hardware
//! let mut controller =
//!     MotionController::new(MockPulse::new(), MockReference::new(), MockDelay::new()).unwrap();
//!
//! // Demand a move
//! controller.move_to(100.0).unwrap();
//! assert_eq!(controller.motion_kind(), MotionKind::MoveTo);
//!
//! // Verify via the pulse source
//! assert!(controller.pulse().enabled);
//! ```
//!
//! [`PulseSource`]: crate::traits::PulseSource
//! [`ReferenceSensor`]: crate::traits::ReferenceSensor
//! [`Delay`]: crate::traits::Delay

use crate::traits::{Delay, Direction, PulseSource, ReferenceSensor};

extern crate alloc;
use alloc::vec::Vec;

// ============================================================================
// Pulse Source Mock
// ============================================================================

/// One recorded pulse-source operation.
///
/// [`MockPulse`] appends an entry per trait call, so tests can assert the
/// exact order of a restart sequence (disable before reconfigure before
/// re-enable), not just the final register values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseOp {
    /// `set_frequency(hz)` was called.
    SetFrequency(u32),
    /// `enable(duty)` was called (duty 0 is a disable).
    Enable(u8),
    /// `set_direction(dir)` was called.
    SetDirection(Direction),
}

/// Mock pulse source for testing.
///
/// Records all frequency, duty, and direction changes for verification.
/// Use the public fields to inspect the latched state, and [`ops`](Self::ops)
/// to assert call ordering.
///
/// # Example
///
/// ```rust
/// use rotaplate::hal::{MockPulse, PulseOp};
/// use rotaplate::traits::{Direction, PulseSource};
///
/// let mut pulse = MockPulse::new();
/// pulse.set_frequency(2000).unwrap();
/// pulse.set_direction(Direction::Forward).unwrap();
/// pulse.enable(128).unwrap();
///
/// assert_eq!(pulse.frequency_hz, 2000);
/// assert!(pulse.enabled);
/// assert_eq!(pulse.ops[0], PulseOp::SetFrequency(2000));
/// ```
#[derive(Debug, Default)]
pub struct MockPulse {
    /// Last programmed frequency in Hz.
    pub frequency_hz: u32,
    /// Last programmed duty (0..=255).
    pub duty: u8,
    /// Whether the pulse train is running (duty > 0).
    pub enabled: bool,
    /// Last latched direction level.
    pub direction: Direction,
    /// Every trait call, in order.
    pub ops: Vec<PulseOp>,
}

impl MockPulse {
    /// Creates a new mock pulse source, disabled, at 0 Hz.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the pulse train was enabled (duty > 0).
    pub fn enable_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PulseOp::Enable(duty) if *duty > 0))
            .count()
    }

    /// Number of times the pulse train was disabled (duty 0).
    pub fn disable_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PulseOp::Enable(0)))
            .count()
    }
}

impl PulseSource for MockPulse {
    type Error = ();

    fn set_frequency(&mut self, hz: u32) -> Result<(), ()> {
        self.frequency_hz = hz;
        self.ops.push(PulseOp::SetFrequency(hz));
        Ok(())
    }

    fn enable(&mut self, duty: u8) -> Result<(), ()> {
        self.duty = duty;
        self.enabled = duty > 0;
        self.ops.push(PulseOp::Enable(duty));
        Ok(())
    }

    fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
        self.direction = dir;
        self.ops.push(PulseOp::SetDirection(dir));
        Ok(())
    }
}

// ============================================================================
// Failing Pulse Source Mock
// ============================================================================

/// Error returned by [`FailingPulse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseFault;

/// Mock pulse source whose operations fail.
///
/// Simulates an unavailable or faulted driver for testing error
/// propagation. [`new`](Self::new) fails on the first operation;
/// [`after`](Self::after) grants a budget of successful operations
/// before failures begin, for mid-run fault scenarios.
///
/// # Example
///
/// ```rust
/// use rotaplate::hal::{FailingPulse, PulseFault};
/// use rotaplate::traits::PulseSource;
///
/// let mut pulse = FailingPulse::after(1);
/// assert_eq!(pulse.set_frequency(2000), Ok(()));
/// assert_eq!(pulse.enable(128), Err(PulseFault));
/// ```
#[derive(Debug, Default)]
pub struct FailingPulse {
    ok_budget: usize,
}

impl FailingPulse {
    /// Creates a pulse source that fails on the first operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pulse source whose first `ok_budget` operations succeed.
    pub fn after(ok_budget: usize) -> Self {
        Self { ok_budget }
    }

    fn op(&mut self) -> Result<(), PulseFault> {
        if self.ok_budget == 0 {
            return Err(PulseFault);
        }
        self.ok_budget -= 1;
        Ok(())
    }
}

impl PulseSource for FailingPulse {
    type Error = PulseFault;

    fn set_frequency(&mut self, _hz: u32) -> Result<(), PulseFault> {
        self.op()
    }

    fn enable(&mut self, _duty: u8) -> Result<(), PulseFault> {
        self.op()
    }

    fn set_direction(&mut self, _dir: Direction) -> Result<(), PulseFault> {
        self.op()
    }
}

// ============================================================================
// Reference Sensor Mock
// ============================================================================

/// Mock reference sensor for testing.
///
/// The level is set directly by the test to simulate the platform passing
/// over the reference position.
///
/// # Example
///
/// ```rust
/// use rotaplate::hal::MockReference;
/// use rotaplate::traits::ReferenceSensor;
///
/// let mut sensor = MockReference::new();
/// assert!(!sensor.is_reference_active());
///
/// sensor.set_active(true);
/// assert!(sensor.is_reference_active());
/// ```
#[derive(Debug, Default)]
pub struct MockReference {
    /// Whether the sensor currently reads active.
    pub active: bool,
    /// Number of times the level was read.
    pub read_count: core::cell::Cell<usize>,
}

impl MockReference {
    /// Creates a new mock sensor reading inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock sensor already sitting on the reference.
    pub fn on_reference() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Set the sensor level.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl ReferenceSensor for MockReference {
    fn is_reference_active(&self) -> bool {
        self.read_count.set(self.read_count.get() + 1);
        self.active
    }
}

// ============================================================================
// Delay Mock
// ============================================================================

/// Mock delay provider for testing.
///
/// Records requested delays instead of sleeping, so tests of restart
/// sequences run instantly while still verifying the settle pause.
///
/// # Example
///
/// ```rust
/// use rotaplate::hal::MockDelay;
/// use rotaplate::traits::Delay;
///
/// let mut delay = MockDelay::new();
/// delay.delay_ms(50);
/// assert_eq!(delay.delays_ms, [50]);
/// assert_eq!(delay.total_ms(), 50);
/// ```
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every requested delay, in order, in milliseconds.
    pub delays_ms: Vec<u32>,
}

impl MockDelay {
    /// Creates a new mock delay with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested delays.
    pub fn total_ms(&self) -> u64 {
        self.delays_ms.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

// ============================================================================
// Tests
// ============================================================================
