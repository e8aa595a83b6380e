//! Event funnel task owning the motion controller.
//!
//! [`MotionRunner`] owns a [`MotionController`] and processes
//! [`MotionEvent`]s from a single-consumer queue. Producers hold a
//! cloneable [`MotionHandle`]:
//!
//! - Protocol connections send commands and await the [`CommandOutcome`]
//!   over a oneshot reply channel
//! - The step-edge notification path posts fire-and-forget events
//! - Status readers request a [`MotionStatus`] snapshot
//!
//! A periodic tick drives motion finalization: the reference sensor is
//! polled during seeks, and a bounded move whose step budget has drained
//! is closed out. Step edges also trigger an immediate finalization check
//! so a completed move stops within one event, not one tick.
//!
//! The runner stops when every handle is dropped, when
//! [`MotionHandle::shutdown`] is called, or when the pulse source reports
//! a hardware error. The pulse train is disabled on the way out.

use core::fmt;
use core::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::commands::{CommandOutcome, MotionCommand};
use crate::controller::{MotionController, MotionStatus};
use crate::traits::{Delay, PulseSource, ReferenceSensor};

/// Default finalization poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

// ============================================================================
// Events
// ============================================================================

/// One input to the motion runner.
///
/// Everything the controller reacts to arrives as a value of this type on
/// the runner's queue, in arrival order.
#[derive(Debug)]
pub enum MotionEvent {
    /// A command from a protocol connection. The outcome is reported back
    /// over the reply channel; a dropped receiver is fine, the command
    /// still applies.
    Command {
        /// The demand to apply.
        cmd: MotionCommand,
        /// Reply channel for the validation outcome.
        reply: oneshot::Sender<CommandOutcome>,
    },

    /// One physical step was taken. Fire-and-forget.
    StepEdge,

    /// Request a state snapshot.
    Status {
        /// Reply channel for the snapshot.
        reply: oneshot::Sender<MotionStatus>,
    },

    /// Stop the runner, disabling the pulse train.
    Shutdown,
}

// ============================================================================
// Handle
// ============================================================================

/// The runner task has stopped and can no longer accept events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunnerClosed;

impl fmt::Display for RunnerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("motion runner has stopped")
    }
}

impl std::error::Error for RunnerClosed {}

/// Cloneable producer handle to the motion runner.
///
/// Cheap to clone; one per protocol connection plus one for the step-edge
/// notification path. When the last handle is dropped the runner stops.
#[derive(Clone, Debug)]
pub struct MotionHandle {
    events: mpsc::UnboundedSender<MotionEvent>,
}

impl MotionHandle {
    /// Send a command and await its validation outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerClosed`] if the runner task has stopped.
    pub async fn command(&self, cmd: MotionCommand) -> Result<CommandOutcome, RunnerClosed> {
        let (reply, rx) = oneshot::channel();
        self.events
            .send(MotionEvent::Command { cmd, reply })
            .map_err(|_| RunnerClosed)?;
        rx.await.map_err(|_| RunnerClosed)
    }

    /// Post a step-edge notification without waiting.
    ///
    /// Never blocks; safe to call from a notification callback. An edge
    /// posted after the runner stopped is silently dropped.
    pub fn step_edge(&self) {
        let _ = self.events.send(MotionEvent::StepEdge);
    }

    /// Request a state snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerClosed`] if the runner task has stopped.
    pub async fn status(&self) -> Result<MotionStatus, RunnerClosed> {
        let (reply, rx) = oneshot::channel();
        self.events
            .send(MotionEvent::Status { reply })
            .map_err(|_| RunnerClosed)?;
        rx.await.map_err(|_| RunnerClosed)
    }

    /// Ask the runner to stop and disable the pulse train.
    pub fn shutdown(&self) {
        let _ = self.events.send(MotionEvent::Shutdown);
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Task owning the [`MotionController`] and its event queue.
pub struct MotionRunner<P: PulseSource, R: ReferenceSensor, D: Delay> {
    controller: MotionController<P, R, D>,
    events: mpsc::UnboundedReceiver<MotionEvent>,
    poll_interval: Duration,
}

impl<P, R, D> MotionRunner<P, R, D>
where
    P: PulseSource + Send + 'static,
    P::Error: fmt::Debug,
    R: ReferenceSensor + Send + 'static,
    D: Delay + Send + 'static,
{
    /// Spawn the runner task with the default poll interval.
    ///
    /// Takes ownership of the controller; all further access goes through
    /// the returned [`MotionHandle`]. The [`JoinHandle`] resolves when the
    /// runner stops.
    pub fn spawn(controller: MotionController<P, R, D>) -> (MotionHandle, JoinHandle<()>) {
        Self::spawn_with_poll_interval(controller, DEFAULT_POLL_INTERVAL)
    }

    /// Spawn the runner task with a custom finalization poll interval.
    pub fn spawn_with_poll_interval(
        controller: MotionController<P, R, D>,
        poll_interval: Duration,
    ) -> (MotionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Self {
            controller,
            events: rx,
            poll_interval,
        };
        let task = tokio::spawn(runner.run());
        (MotionHandle { events: tx }, task)
    }

    async fn run(mut self) {
        let mut tick = tokio::time::interval(self.poll_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("motion runner started");
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    match event {
                        Some(MotionEvent::Command { cmd, reply }) => {
                            match self.controller.apply_command(cmd) {
                                Ok(outcome) => {
                                    debug!(?cmd, ?outcome, "command processed");
                                    let _ = reply.send(outcome);
                                }
                                Err(err) => {
                                    error!(?err, "pulse source failure, stopping runner");
                                    break;
                                }
                            }
                        }
                        Some(MotionEvent::StepEdge) => {
                            self.controller.on_step_edge();
                            // close out a drained move without waiting for
                            // the next tick
                            if let Err(err) = self.controller.poll() {
                                error!(?err, "pulse source failure, stopping runner");
                                break;
                            }
                        }
                        Some(MotionEvent::Status { reply }) => {
                            let _ = reply.send(self.controller.status());
                        }
                        Some(MotionEvent::Shutdown) | None => break,
                    }
                }
                _ = tick.tick() => {
                    if let Err(err) = self.controller.poll() {
                        error!(?err, "pulse source failure, stopping runner");
                        break;
                    }
                }
            }
        }

        if let Err(err) = self.controller.shutdown() {
            error!(?err, "failed to disable pulse source on shutdown");
        }
        info!("motion runner stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
