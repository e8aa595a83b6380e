//! Motor state and step geometry.
//!
//! This module holds the single mutable [`MotorState`] entity owned by the
//! motion controller, plus the microstep/frequency math that converts
//! between degrees, steps, RPM, and pulse frequency.
//!
//! # Step geometry
//!
//! The motor has 200 full steps per revolution. At a microstep ratio `r`
//! one pulse advances the platform by `360 / (200 * r)` degrees:
//!
//! ```rust
//! use rotaplate::Microstep;
//!
//! assert_eq!(Microstep::X32.step_resolution_degrees(), 360.0 / 6400.0);
//! assert_eq!(Microstep::X1.step_resolution_degrees(), 1.8);
//! ```

use crate::traits::Direction;

/// Full motor steps per revolution (1.8 degree stepper).
pub const FULL_STEPS_PER_REV: u32 = 200;

/// Angular position the platform is reset to when the reference sensor
/// fires during a seek.
pub const DEFAULT_REFERENCE_POSITION: f64 = 90.0;

/// RPM used to derive the per-ratio default pulse frequency after a
/// microstep change.
pub const DEFAULT_RPM: u32 = 18;

/// Fixed slow pulse frequency used while seeking the reference.
pub const SEEK_FREQUENCY_HZ: u32 = 500;

/// PWM duty used whenever the pulse train is running (50% of 255).
pub const RUN_DUTY: u8 = 128;

/// Settle pause between disabling pulses and re-enabling them with a new
/// direction or frequency, so the driver latches DIR before the first
/// pulse.
pub const DIRECTION_SETTLE_MS: u32 = 50;

// ============================================================================
// Microstep ratio
// ============================================================================

/// Driver microstep configuration.
///
/// One of the six subdivision ratios supported by DRV8825-class drivers.
/// The ratio determines the step resolution and, through it, the pulse
/// frequency needed for a given RPM.
///
/// # Persisted encoding
///
/// Configuration files store the ratio as a code 0-5
/// (0 = full step, 5 = 1/32), see [`Microstep::from_code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Microstep {
    /// Full step (1.8 degrees per pulse).
    X1,
    /// Half step.
    X2,
    /// Quarter step.
    X4,
    /// Eighth step.
    X8,
    /// Sixteenth step.
    X16,
    /// Thirty-second step (finest resolution, 0.05625 degrees).
    X32,
}

impl Default for Microstep {
    /// The maximal ratio, matching controller startup.
    fn default() -> Self {
        Microstep::X32
    }
}

impl Microstep {
    /// The subdivision ratio as a plain integer.
    #[inline]
    pub const fn ratio(&self) -> u32 {
        match self {
            Microstep::X1 => 1,
            Microstep::X2 => 2,
            Microstep::X4 => 4,
            Microstep::X8 => 8,
            Microstep::X16 => 16,
            Microstep::X32 => 32,
        }
    }

    /// Degrees advanced by one pulse at this ratio: `360 / (200 * ratio)`.
    #[inline]
    pub fn step_resolution_degrees(&self) -> f64 {
        360.0 / (FULL_STEPS_PER_REV as f64 * self.ratio() as f64)
    }

    /// The default pulse frequency applied after switching to this ratio.
    ///
    /// Chosen so every ratio starts at [`DEFAULT_RPM`]:
    /// `DEFAULT_RPM * 200 * ratio / 60`, i.e. 60 Hz per unit of ratio.
    #[inline]
    pub const fn default_frequency_hz(&self) -> u32 {
        DEFAULT_RPM * FULL_STEPS_PER_REV * self.ratio() / 60
    }

    /// The persisted numeric code (0 = full step .. 5 = 1/32).
    #[inline]
    pub const fn as_code(&self) -> u8 {
        match self {
            Microstep::X1 => 0,
            Microstep::X2 => 1,
            Microstep::X4 => 2,
            Microstep::X8 => 3,
            Microstep::X16 => 4,
            Microstep::X32 => 5,
        }
    }

    /// Parse the persisted numeric code.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotaplate::Microstep;
    ///
    /// assert_eq!(Microstep::from_code(0), Some(Microstep::X1));
    /// assert_eq!(Microstep::from_code(5), Some(Microstep::X32));
    /// assert_eq!(Microstep::from_code(6), None);
    /// ```
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Microstep::X1),
            1 => Some(Microstep::X2),
            2 => Some(Microstep::X4),
            3 => Some(Microstep::X8),
            4 => Some(Microstep::X16),
            5 => Some(Microstep::X32),
            _ => None,
        }
    }

    /// Parse a raw subdivision ratio (1, 2, 4, 8, 16, 32).
    pub const fn from_ratio(ratio: u32) -> Option<Self> {
        match ratio {
            1 => Some(Microstep::X1),
            2 => Some(Microstep::X2),
            4 => Some(Microstep::X4),
            8 => Some(Microstep::X8),
            16 => Some(Microstep::X16),
            32 => Some(Microstep::X32),
            _ => None,
        }
    }
}

// ============================================================================
// Frequency / RPM conversions
// ============================================================================

/// Pulse frequency needed to turn at `rpm` at the given microstep ratio.
///
/// `round(360 * rpm / (step_resolution * 60))`, which reduces to
/// `round(rpm * 200 * ratio / 60)`.
///
/// # Examples
///
/// ```
/// use rotaplate::state::frequency_for_rpm;
/// use rotaplate::Microstep;
///
/// // 18.75 RPM at 1/32 is the classic 2000 Hz
/// assert_eq!(frequency_for_rpm(18.75, Microstep::X32), 2000);
/// ```
pub fn frequency_for_rpm(rpm: f64, microstep: Microstep) -> u32 {
    let res = microstep.step_resolution_degrees();
    round_half_up(360.0 * rpm / (res * 60.0)) as u32
}

/// RPM achieved by a pulse frequency at the given microstep ratio.
///
/// Inverse of [`frequency_for_rpm`] up to integer rounding:
/// `resolution * frequency * 60 / 360`.
pub fn rpm_for_frequency(hz: u32, microstep: Microstep) -> f64 {
    microstep.step_resolution_degrees() * hz as f64 * 60.0 / 360.0
}

// f64::round is not available without std; inputs here are always
// non-negative frequencies.
#[inline]
fn round_half_up(x: f64) -> f64 {
    (x + 0.5) as i64 as f64
}

// ============================================================================
// Motion kind
// ============================================================================

/// What the platform is currently doing.
///
/// At most one motion is active at any time; [`Idle`](Self::Idle) is the
/// only state from which a new motion is accepted, and the only state in
/// which the microstep configuration may change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MotionKind {
    /// No motion active; commands are accepted.
    #[default]
    Idle,
    /// Free-running pulse train with no step budget; position is not
    /// tracked.
    Continuous,
    /// Slow forward run until the reference sensor fires.
    SeekReference,
    /// Bounded move with a pending-step budget.
    MoveTo,
}

impl MotionKind {
    /// Lowercase name for status reporting.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotionKind::Idle => "idle",
            MotionKind::Continuous => "continuous",
            MotionKind::SeekReference => "seek_reference",
            MotionKind::MoveTo => "move_to",
        }
    }

    /// True for every variant except `Idle`.
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, MotionKind::Idle)
    }
}

// ============================================================================
// Motor state
// ============================================================================

/// The single mutable motor entity, exclusively owned by the controller.
///
/// Holds logical position, motion bookkeeping, and the speed/microstep
/// configuration. All mutation happens through
/// [`MotionController`](crate::MotionController) operations and its
/// step-edge handler; nothing else may touch this struct.
#[derive(Clone, Debug)]
pub struct MotorState {
    /// Logical angular position in degrees. Conceptually [0, 360) but not
    /// wrapped; slow monotonic drift is expected and corrected by
    /// reference seeks.
    pub position: f64,
    /// Direction of the current or next run.
    pub direction: Direction,
    /// Driver microstep configuration.
    pub microstep: Microstep,
    /// Pulse frequency for normal runs, derived from the demanded RPM.
    pub pulse_frequency_hz: u32,
    /// Current motion variant.
    pub motion_kind: MotionKind,
    /// Steps remaining for a bounded move. Meaningless outside `MoveTo`.
    pub pending_steps: u32,
    /// Whether step edges adjust `position`. True for `MoveTo` and
    /// `SeekReference`, false for `Continuous`.
    pub update_position_on_step: bool,
}

impl Default for MotorState {
    fn default() -> Self {
        let microstep = Microstep::default();
        Self {
            position: DEFAULT_REFERENCE_POSITION,
            direction: Direction::Forward,
            microstep,
            pulse_frequency_hz: microstep.default_frequency_hz(),
            motion_kind: MotionKind::Idle,
            pending_steps: 0,
            update_position_on_step: false,
        }
    }
}

impl MotorState {
    /// Degrees advanced per pulse at the current microstep configuration.
    #[inline]
    pub fn step_resolution_degrees(&self) -> f64 {
        self.microstep.step_resolution_degrees()
    }

    /// Demanded speed in RPM, recovered from the configured frequency.
    #[inline]
    pub fn rpm(&self) -> f64 {
        rpm_for_frequency(self.pulse_frequency_hz, self.microstep)
    }
}
