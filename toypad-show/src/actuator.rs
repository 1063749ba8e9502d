//! Pad actuator interface
//!
//! The actuator is the hardware side of playback: it receives one call per
//! executed command. Loop workers for different pads call it concurrently,
//! so implementations must be `Send + Sync` and serialise device access
//! themselves if the device needs it.

use std::fmt;

use toypad_lstf::{Pad, Rgb};

use crate::error::ActuatorError;

/// Destination of an actuator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadTarget {
    /// Every pad at once (broadcast)
    All,
    Pad(Pad),
}

impl PadTarget {
    /// Identifier used on the wire (0 is broadcast)
    pub fn wire_id(self) -> u8 {
        match self {
            PadTarget::All => Pad::BROADCAST_ID,
            PadTarget::Pad(pad) => pad.wire_id(),
        }
    }
}

impl From<Pad> for PadTarget {
    fn from(pad: Pad) -> Self {
        PadTarget::Pad(pad)
    }
}

impl fmt::Display for PadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadTarget::All => f.write_str("all"),
            PadTarget::Pad(pad) => pad.fmt(f),
        }
    }
}

/// Hardware output for pad lighting
///
/// Timing arguments are actuator units (about 10ms each) and are always at
/// least 1 when called from a loop worker.
pub trait PadActuator: Send + Sync {
    /// Switch immediately to `colour`
    fn set_colour(&self, target: PadTarget, colour: Rgb) -> Result<(), ActuatorError>;

    /// Fade to `colour`, `pulse_count` times
    fn fade(
        &self,
        target: PadTarget,
        pulse_time: u8,
        pulse_count: u8,
        colour: Rgb,
    ) -> Result<(), ActuatorError>;

    /// Flash `colour` on and off `pulse_count` times
    fn flash(
        &self,
        target: PadTarget,
        on_length: u8,
        off_length: u8,
        pulse_count: u8,
        colour: Rgb,
    ) -> Result<(), ActuatorError>;
}
