//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that allow rotaplate to run against real
//! step/direction driver hardware or against desktop mocks:
//!
//! - [`PulseSource`]: step waveform generator (frequency, duty, enable)
//! - [`ReferenceSensor`]: boolean level read of the reference detector
//! - [`Delay`]: blocking settle delay used around direction/speed restarts
//!
//! The [`Direction`] enum lives here too since both the pulse-source
//! wiring and the motion controller share it.
//!
//! For testing without hardware, use the implementations in
//! [`crate::hal::mock`].

pub mod hardware;

pub use hardware::*;
