//! Hardware abstraction traits for the pulse source, reference sensor, and
//! settle delays.
//!
//! This module defines the hardware interfaces that allow rotaplate to work
//! across different platforms (Raspberry Pi style GPIO drivers, desktop
//! mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PulseSource`] | Step waveform generation for a step/direction driver |
//! | [`ReferenceSensor`] | Level read of the reference position detector |
//! | [`Delay`] | Blocking millisecond delay for direction-latch settling |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`].
//!
//! # Example
//!
//! ```rust
//! use rotaplate::traits::PulseSource;
//! use rotaplate::hal::MockPulse;
//!
//! let mut pulse = MockPulse::new();
//! pulse.set_frequency(2000).unwrap();
//! pulse.enable(128).unwrap();
//! assert!(pulse.enabled);
//! ```

/// Direction of platform rotation.
///
/// Drives the level of the driver's DIR pin. The DIR level must be latched
/// before the first pulse of a run, which is why restarts that change
/// direction go through a settle delay.
///
/// # Default
///
/// Defaults to [`Forward`](Self::Forward), matching the reference-seek
/// direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Rotating toward increasing angle (DIR pin high).
    #[default]
    Forward,
    /// Rotating toward decreasing angle (DIR pin low).
    Backward,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotaplate::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Backward.as_str(), "backward");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    /// The opposite direction.
    #[inline]
    pub const fn flipped(&self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Sign of a position change per step in this direction.
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// The persisted numeric encoding (0 = backward, 1 = forward).
    ///
    /// Matches the DIR pin level and the first line of the persisted
    /// configuration format.
    #[inline]
    pub const fn as_code(&self) -> u8 {
        match self {
            Direction::Backward => 0,
            Direction::Forward => 1,
        }
    }

    /// Parse the persisted numeric encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotaplate::Direction;
    ///
    /// assert_eq!(Direction::from_code(0), Some(Direction::Backward));
    /// assert_eq!(Direction::from_code(1), Some(Direction::Forward));
    /// assert_eq!(Direction::from_code(7), None);
    /// ```
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Direction::Backward),
            1 => Some(Direction::Forward),
            _ => None,
        }
    }
}

/// Pulse source trait - abstracts the step waveform generator.
///
/// Implement this trait for your step-pin driver. The pulse source emits a
/// continuous square wave at a settable frequency; each physical step taken
/// by the motor is reported back to the controller as a step-edge event
/// (delivered outside this trait, through whatever notification path the
/// platform provides).
///
/// # Implementation Notes
///
/// - `enable(0)` and `disable()` must be equivalent
/// - `set_frequency` while enabled should take effect on the running train
/// - The controller always calls `disable()` before reconfiguring and
///   re-enabling; implementations must not emit pulses while disabled
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rotaplate::traits::{Direction, PulseSource};
///
/// struct PwmPulse { /* gpio handles */ }
///
/// impl PulseSource for PwmPulse {
///     type Error = ();
///
///     fn set_frequency(&mut self, hz: u32) -> Result<(), ()> {
///         // Program the PWM divider...
///         Ok(())
///     }
///
///     fn enable(&mut self, duty: u8) -> Result<(), ()> {
///         // Set PWM duty cycle...
///         Ok(())
///     }
///
///     fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
///         // Set the DIR pin level...
///         Ok(())
///     }
/// }
/// ```
pub trait PulseSource {
    /// Error type for pulse operations.
    type Error;

    /// Set the pulse frequency in Hz.
    fn set_frequency(&mut self, hz: u32) -> Result<(), Self::Error>;

    /// Start emitting pulses at the given duty (0..=255).
    ///
    /// A duty of 0 stops the pulse train.
    fn enable(&mut self, duty: u8) -> Result<(), Self::Error>;

    /// Stop emitting pulses.
    ///
    /// Equivalent to `enable(0)`.
    fn disable(&mut self) -> Result<(), Self::Error> {
        self.enable(0)
    }

    /// Latch the direction level on the driver.
    ///
    /// Must be called only while pulses are disabled; the driver samples
    /// DIR on the first step edge.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;
}

/// Reference sensor trait.
///
/// A level read of the sensor that detects the platform's known physical
/// reference position. Polled by the controller's finalization path while
/// a reference seek is active.
pub trait ReferenceSensor {
    /// Returns true while the platform sits on the reference position.
    fn is_reference_active(&self) -> bool;
}

/// Blocking millisecond delay.
///
/// Used for the short settle pause between disabling the pulse train and
/// re-enabling it with a new direction or frequency, so the driver latches
/// the DIR level before the first pulse. The delay is deliberate and short
/// (tens of milliseconds); it is never cancelled or timed out.
pub trait Delay {
    /// Block for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// [`Delay`] backed by `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Direction Tests
    // =========================================================================

    #[test]
    fn direction_default_is_forward() {
        assert_eq!(Direction::default(), Direction::Forward);
    }

    #[test]
    fn direction_flipped() {
        assert_eq!(Direction::Forward.flipped(), Direction::Backward);
        assert_eq!(Direction::Backward.flipped(), Direction::Forward);
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Backward.sign(), -1.0);
    }

    #[test]
    fn direction_code_round_trip() {
        for dir in [Direction::Forward, Direction::Backward] {
            assert_eq!(Direction::from_code(dir.as_code()), Some(dir));
        }
        assert_eq!(Direction::from_code(2), None);
    }

    #[test]
    fn direction_as_str() {
        assert_eq!(Direction::Forward.as_str(), "forward");
        assert_eq!(Direction::Backward.as_str(), "backward");
    }

    // =========================================================================
    // PulseSource Default Methods Tests
    // =========================================================================

    struct TestPulse {
        duty: u8,
        enable_calls: usize,
    }

    impl PulseSource for TestPulse {
        type Error = ();

        fn set_frequency(&mut self, _hz: u32) -> Result<(), ()> {
            Ok(())
        }

        fn enable(&mut self, duty: u8) -> Result<(), ()> {
            self.duty = duty;
            self.enable_calls += 1;
            Ok(())
        }

        fn set_direction(&mut self, _dir: Direction) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn pulse_source_disable_default_impl() {
        let mut pulse = TestPulse {
            duty: 128,
            enable_calls: 0,
        };

        pulse.disable().unwrap();

        assert_eq!(pulse.duty, 0);
        assert_eq!(pulse.enable_calls, 1);
    }
}
