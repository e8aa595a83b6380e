//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development

pub mod mock;

pub use mock::*;
