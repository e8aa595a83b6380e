//! Async services around the motion controller.
//!
//! This module provides the `runtime` feature's event funnel: a single
//! task owns the [`MotionController`](crate::MotionController) and every
//! producer (protocol connections, the step-edge notification path, status
//! readers) talks to it through one channel.
//!
//! # Event Funnel Pattern
//!
//! The controller is not shared behind a lock. Instead, all inputs become
//! [`MotionEvent`]s on a single-consumer queue, so arrival order is
//! processing order and command validation can never interleave with
//! step-edge bookkeeping:
//!
//! ```ignore
//! use rotaplate::services::MotionRunner;
//!
//! let (handle, task) = MotionRunner::spawn(controller);
//!
//! // Protocol connections clone the handle
//! let outcome = handle.command(MotionCommand::StartContinuous).await?;
//!
//! // The step-edge interrupt path posts without waiting
//! handle.step_edge();
//! ```

pub mod runner;

pub use runner::*;
