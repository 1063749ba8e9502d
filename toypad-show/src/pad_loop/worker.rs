//! Pad loop worker thread

use std::sync::Arc;
use std::time::{Duration, Instant};

use toypad_lstf::{Pad, PadCommand, Program};
use tracing::{debug, error, trace};

use super::LoopShared;
use crate::actuator::{PadActuator, PadTarget};
use crate::error::ActuatorError;

/// Worker state, moved into the loop thread
pub(super) struct PadLoopWorker {
    pub(super) actuator: Arc<dyn PadActuator>,
    pub(super) pad: Pad,
    pub(super) program: Arc<Program>,
    pub(super) source: Pad,
    pub(super) shared: Arc<LoopShared>,
    pub(super) poll_interval: Duration,
    pub(super) min_loop_seconds: f64,
}

/// Offset in seconds as a `Duration` (negative or non-finite become zero)
fn offset(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

impl PadLoopWorker {
    pub(super) fn run(self) {
        let Some(track) = self.program.track(self.source) else {
            return;
        };
        if track.is_empty() {
            debug!("Pad loop on {} has no commands; exiting", self.pad);
            return;
        }
        let period = offset(track.duration().max(self.min_loop_seconds));

        let mut cycle_start = Instant::now();
        while !self.shared.is_stopped() {
            for command in track.commands() {
                if !self
                    .shared
                    .wait_until(cycle_start + offset(command.time()), self.poll_interval)
                {
                    return;
                }
                if let Err(err) = self.execute(command) {
                    error!(
                        "Pad loop on {} stopped after {} failed: {}",
                        self.pad,
                        command.action(),
                        err
                    );
                    self.shared.record_fault(err);
                    return;
                }
                if self.shared.is_stopped() {
                    return;
                }
            }
            cycle_start += period;
        }
    }

    fn execute(&self, command: &PadCommand) -> Result<(), ActuatorError> {
        let target = PadTarget::from(self.pad);
        trace!(
            "{} {} -> {} at {:.3}s",
            target,
            command.action(),
            command.colour(),
            command.time()
        );
        match *command {
            PadCommand::Switch { colour, .. } => self.actuator.set_colour(target, colour),
            PadCommand::Fade {
                colour,
                pulse_time,
                pulse_count,
                ..
            } => self
                .actuator
                .fade(target, pulse_time.max(1), pulse_count.max(1), colour),
            PadCommand::Flash {
                colour,
                on_length,
                off_length,
                pulse_count,
                ..
            } => self.actuator.flash(
                target,
                on_length.max(1),
                off_length.max(1),
                pulse_count.max(1),
                colour,
            ),
        }
    }
}
