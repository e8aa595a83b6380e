//! Command types and outcomes for the motion controller.
//!
//! This module defines the command surface the remote protocol layer uses,
//! one [`MotionCommand`] variant per remote command byte, and the
//! [`CommandOutcome`] returned for each.
//!
//! # Command Flow
//!
//! 1. The protocol layer decodes a command byte into a [`MotionCommand`]
//! 2. The command reaches the controller (directly, or through the
//!    `services::runner` event funnel when the `runtime` feature is on)
//! 3. The controller validates it against the current motion state and
//!    returns a [`CommandOutcome`]
//!
//! # Rejections are values, not errors
//!
//! A command refused because a motion is active is a normal, expected
//! result - the protocol layer reports it to the remote user and nothing
//! is retried. Only pulse-source hardware failures surface as `Err`.
//!
//! ```rust
//! use rotaplate::{CommandOutcome, RejectReason};
//!
//! let outcome = CommandOutcome::Rejected(RejectReason::Busy);
//! assert!(!outcome.is_accepted());
//! ```

use crate::state::Microstep;

// ============================================================================
// Commands
// ============================================================================

/// A demand issued to the motion controller.
///
/// Each variant corresponds to one operation of the remote command
/// protocol. All are validated synchronously; motion completion is
/// asynchronous and observed through
/// [`MotionStatus`](crate::MotionStatus).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MotionCommand {
    /// Move the platform to an absolute position in degrees.
    MoveTo(f64),

    /// Advance one step-resolution unit in the current direction.
    AdvanceOneUnit,

    /// Run forward slowly until the reference sensor fires, then re-anchor
    /// the logical position.
    SeekReference,

    /// Start a free-running pulse train at the configured speed and
    /// direction.
    StartContinuous,

    /// Stop whatever motion is active. Idempotent.
    Stop,

    /// Flip the rotation direction, restarting the pulse train if one is
    /// running.
    SwitchDirection,

    /// Change the demanded speed in RPM.
    ///
    /// Bounds (minimum/maximum RPM) are the caller's responsibility.
    SetSpeed(f64),

    /// Change the driver microstep configuration. Only accepted while
    /// idle.
    SetMicrostep(Microstep),
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a command was refused.
///
/// Returned inside [`CommandOutcome::Rejected`]; never escalated past the
/// controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RejectReason {
    /// A motion command arrived while another motion is active.
    Busy,

    /// A configuration change (microstep) arrived while moving.
    ConfigLocked,
}

/// Result of applying a [`MotionCommand`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandOutcome {
    /// The command was applied. For motion commands this means the pulse
    /// train was started; completion comes later.
    Applied,

    /// A `MoveTo` whose target is within one step resolution of the
    /// current position. Success with zero steps issued.
    AlreadyAtTarget,

    /// The command was refused and state is unchanged.
    Rejected(RejectReason),
}

impl CommandOutcome {
    /// True unless the command was rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotaplate::{CommandOutcome, RejectReason};
    ///
    /// assert!(CommandOutcome::Applied.is_accepted());
    /// assert!(CommandOutcome::AlreadyAtTarget.is_accepted());
    /// assert!(!CommandOutcome::Rejected(RejectReason::Busy).is_accepted());
    /// ```
    #[inline]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, CommandOutcome::Rejected(_))
    }

    /// The rejection reason, if the command was refused.
    #[inline]
    pub const fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CommandOutcome::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accepted() {
        assert!(CommandOutcome::Applied.is_accepted());
        assert!(CommandOutcome::AlreadyAtTarget.is_accepted());
        assert!(!CommandOutcome::Rejected(RejectReason::Busy).is_accepted());
        assert!(!CommandOutcome::Rejected(RejectReason::ConfigLocked).is_accepted());
    }

    #[test]
    fn outcome_reject_reason() {
        assert_eq!(CommandOutcome::Applied.reject_reason(), None);
        assert_eq!(
            CommandOutcome::Rejected(RejectReason::Busy).reject_reason(),
            Some(RejectReason::Busy)
        );
    }

    #[test]
    fn commands_are_comparable() {
        assert_eq!(MotionCommand::MoveTo(90.0), MotionCommand::MoveTo(90.0));
        assert_ne!(MotionCommand::Stop, MotionCommand::StartContinuous);
        assert_eq!(
            MotionCommand::SetMicrostep(Microstep::X8),
            MotionCommand::SetMicrostep(Microstep::X8)
        );
    }
}
