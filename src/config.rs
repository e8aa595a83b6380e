//! Persisted platform configuration.
//!
//! The platform remembers its direction, speed, and microstep setting
//! across restarts through a tiny three-line text file:
//!
//! ```text
//! 1        <- direction code (0 = backward, 1 = forward)
//! 18       <- speed in RPM (integer)
//! 5        <- microstep code (0 = full step .. 5 = 1/32)
//! ```
//!
//! A missing or malformed file is never an error at startup: each field
//! that cannot be parsed falls back to its default, so the platform always
//! comes up in a usable state.
//!
//! # Example
//!
//! ```rust
//! use rotaplate::{Direction, Microstep, PlatformConfig};
//!
//! // Use defaults
//! let config = PlatformConfig::default();
//! assert_eq!(config.rpm, 18);
//!
//! // Or customize
//! let config = PlatformConfig::default()
//!     .with_direction(Direction::Backward)
//!     .with_rpm(30)
//!     .with_microstep(Microstep::X8);
//! assert_eq!(config.to_file_string().as_str(), "0\n30\n3\n");
//! ```

use heapless::String as HString;
use tracing::warn;

use crate::state::{Microstep, DEFAULT_RPM};
use crate::traits::Direction;

/// Maximum length of the serialized config file
pub const MAX_FILE_STRING: usize = 32;

/// Type alias for the serialized config text
pub type FileString = HString<MAX_FILE_STRING>;

// ============================================================================
// Platform Config
// ============================================================================

/// Persisted platform configuration.
///
/// Holds the three settings that survive restarts. Applied to a
/// [`MotionController`](crate::MotionController) at startup via
/// [`apply_config`](crate::MotionController::apply_config).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlatformConfig {
    /// Rotation direction for the next run.
    pub direction: Direction,
    /// Speed in RPM. Bounds are enforced by the protocol layer, not here.
    pub rpm: u32,
    /// Driver microstep configuration.
    pub microstep: Microstep,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            rpm: DEFAULT_RPM,
            microstep: Microstep::X32,
        }
    }
}

impl PlatformConfig {
    /// Set the direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the speed in RPM
    pub fn with_rpm(mut self, rpm: u32) -> Self {
        self.rpm = rpm;
        self
    }

    /// Set the microstep configuration
    pub fn with_microstep(mut self, microstep: Microstep) -> Self {
        self.microstep = microstep;
        self
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Parse the three-line file format.
    ///
    /// Each line that is missing or fails to parse falls back to its
    /// default; a completely empty or garbage input yields
    /// `PlatformConfig::default()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotaplate::{Direction, Microstep, PlatformConfig};
    ///
    /// let config = PlatformConfig::from_file_string("0\n25\n3\n");
    /// assert_eq!(config.direction, Direction::Backward);
    /// assert_eq!(config.rpm, 25);
    /// assert_eq!(config.microstep, Microstep::X8);
    ///
    /// // Bad middle line, the rest still applies
    /// let config = PlatformConfig::from_file_string("0\nfast\n3\n");
    /// assert_eq!(config.rpm, 18);
    /// assert_eq!(config.microstep, Microstep::X8);
    /// ```
    pub fn from_file_string(text: &str) -> Self {
        let defaults = Self::default();
        let mut lines = text.lines();

        let direction = lines
            .next()
            .and_then(|line| line.trim().parse::<u8>().ok())
            .and_then(Direction::from_code)
            .unwrap_or_else(|| {
                warn!("bad direction line in config, using default");
                defaults.direction
            });

        let rpm = lines
            .next()
            .and_then(|line| line.trim().parse::<u32>().ok())
            .unwrap_or_else(|| {
                warn!("bad rpm line in config, using default");
                defaults.rpm
            });

        let microstep = lines
            .next()
            .and_then(|line| line.trim().parse::<u8>().ok())
            .and_then(Microstep::from_code)
            .unwrap_or_else(|| {
                warn!("bad microstep line in config, using default");
                defaults.microstep
            });

        Self {
            direction,
            rpm,
            microstep,
        }
    }

    /// Serialize to the three-line file format, with a trailing newline.
    pub fn to_file_string(&self) -> FileString {
        use core::fmt::Write;

        let mut text = FileString::new();
        let _ = write!(
            text,
            "{}\n{}\n{}\n",
            self.direction.as_code(),
            self.rpm,
            self.microstep.as_code()
        );
        text
    }

    // ========================================================================
    // File I/O
    // ========================================================================

    /// Load the configuration from a file, falling back to defaults.
    ///
    /// An unreadable file (missing, permissions, not UTF-8) yields
    /// `PlatformConfig::default()` with a log line; startup never fails on
    /// configuration.
    #[cfg(feature = "std")]
    pub fn load_or_default(path: impl AsRef<std::path::Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::from_file_string(&text),
            Err(err) => {
                warn!(path = %path.as_ref().display(), %err, "config not readable, using defaults");
                Self::default()
            }
        }
    }

    /// Write the configuration to a file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written. Callers log and carry on; a
    /// failed save only costs persistence across the next restart.
    #[cfg(feature = "std")]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        use anyhow::Context;

        std::fs::write(path.as_ref(), self.to_file_string().as_bytes())
            .with_context(|| format!("writing config to {}", path.as_ref().display()))
    }
}

// ============================================================================
// Tests
// ============================================================================
