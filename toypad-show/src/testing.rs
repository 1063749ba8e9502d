//! Test helpers: an in-memory actuator and short programs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use toypad_lstf::{Pad, PadCommand, PadTrack, Program, Rgb};

use crate::actuator::{PadActuator, PadTarget};
use crate::error::ActuatorError;

/// One recorded actuator call
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Call {
    Colour(Rgb),
    Fade {
        pulse_time: u8,
        pulse_count: u8,
        colour: Rgb,
    },
    Flash {
        on_length: u8,
        off_length: u8,
        pulse_count: u8,
        colour: Rgb,
    },
}

impl Call {
    pub(crate) fn colour(&self) -> Rgb {
        match *self {
            Call::Colour(colour) | Call::Fade { colour, .. } | Call::Flash { colour, .. } => colour,
        }
    }
}

/// Actuator that records every call and can be told to fail
#[derive(Default)]
pub(crate) struct RecordingActuator {
    calls: Mutex<Vec<(Instant, PadTarget, Call)>>,
    fail_on: Mutex<Option<PadTarget>>,
}

impl RecordingActuator {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every call aimed at `target`
    pub(crate) fn fail_on(&self, target: PadTarget) {
        *self.fail_on.lock().unwrap() = Some(target);
    }

    fn record(&self, target: PadTarget, call: Call) -> Result<(), ActuatorError> {
        if *self.fail_on.lock().unwrap() == Some(target) {
            return Err(ActuatorError::new(format!("{} unplugged", target)));
        }
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), target, call));
        Ok(())
    }

    pub(crate) fn calls(&self) -> Vec<(PadTarget, Call)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target, call)| (*target, *call))
            .collect()
    }

    /// Calls made to `pad` since `since`
    pub(crate) fn calls_for_since(&self, pad: Pad, since: Instant) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(at, target, _)| *at >= since && *target == PadTarget::Pad(pad))
            .map(|(_, _, call)| *call)
            .collect()
    }

    pub(crate) fn calls_for(&self, pad: Pad) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, target, _)| *target == PadTarget::Pad(pad))
            .map(|(_, _, call)| *call)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PadActuator for RecordingActuator {
    fn set_colour(&self, target: PadTarget, colour: Rgb) -> Result<(), ActuatorError> {
        self.record(target, Call::Colour(colour))
    }

    fn fade(
        &self,
        target: PadTarget,
        pulse_time: u8,
        pulse_count: u8,
        colour: Rgb,
    ) -> Result<(), ActuatorError> {
        self.record(
            target,
            Call::Fade {
                pulse_time,
                pulse_count,
                colour,
            },
        )
    }

    fn flash(
        &self,
        target: PadTarget,
        on_length: u8,
        off_length: u8,
        pulse_count: u8,
        colour: Rgb,
    ) -> Result<(), ActuatorError> {
        self.record(
            target,
            Call::Flash {
                on_length,
                off_length,
                pulse_count,
                colour,
            },
        )
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes
pub(crate) fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Track that switches to `colour` at the start of every `period` seconds
pub(crate) fn solid_track(colour: Rgb, period: f64) -> PadTrack {
    PadTrack::new(vec![PadCommand::Switch { time: 0.0, colour }], period)
}

/// Program with the same solid colour on every listed pad
pub(crate) fn solid_program(pads: &[Pad], colour: Rgb, period: f64) -> Arc<Program> {
    let tracks: BTreeMap<Pad, PadTrack> = pads
        .iter()
        .map(|pad| (*pad, solid_track(colour, period)))
        .collect();
    Arc::new(Program::new(tracks))
}

/// Full three-pad program
pub(crate) fn full_program(colour: Rgb, period: f64) -> Arc<Program> {
    solid_program(&Pad::ALL, colour, period)
}
