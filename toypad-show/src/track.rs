//! Track handles
//!
//! A [`TrackHandle`] binds a [`Program`] to target pads and manages one
//! [`PadLoop`] per bound pad. Starting a handle always begins every loop
//! from loop-start; nothing resumes mid-cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use toypad_lstf::{Pad, Program};
use tracing::warn;

use crate::actuator::PadActuator;
use crate::config::PlaybackConfig;
use crate::error::{ActuatorError, ShowError};
use crate::pad_loop::PadLoop;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a track handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        TrackId(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// A program bound to pads, with the loops currently playing it
pub struct TrackHandle {
    id: TrackId,
    program: Arc<Program>,
    /// Target pad -> pad of the program track it plays
    bindings: BTreeMap<Pad, Pad>,
    loops: BTreeMap<Pad, PadLoop>,
    actuator: Arc<dyn PadActuator>,
    config: PlaybackConfig,
}

impl TrackHandle {
    fn with_bindings(
        program: Arc<Program>,
        bindings: BTreeMap<Pad, Pad>,
        actuator: Arc<dyn PadActuator>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            id: TrackId::next(),
            program,
            bindings,
            loops: BTreeMap::new(),
            actuator,
            config,
        }
    }

    /// Handle playing every pad of a multi-pad program on its own pad
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the program is generic or empty.
    pub fn for_program(
        program: Arc<Program>,
        actuator: Arc<dyn PadActuator>,
        config: PlaybackConfig,
    ) -> Result<Self, ShowError> {
        if program.is_empty() {
            return Err(ShowError::InvalidInput("program has no pad tracks".into()));
        }
        if program.is_generic() {
            return Err(ShowError::InvalidInput(
                "generic programs must be bound to a pad".into(),
            ));
        }
        let bindings = program.pads().map(|pad| (pad, pad)).collect();
        Ok(Self::with_bindings(program, bindings, actuator, config))
    }

    /// Handle playing one track of `program` on `pad`
    ///
    /// A generic program's only track is bound to `pad`; a multi-pad program
    /// contributes its own `pad` track.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a multi-pad program has no track for `pad`.
    pub fn for_pad(
        pad: Pad,
        program: Arc<Program>,
        actuator: Arc<dyn PadActuator>,
        config: PlaybackConfig,
    ) -> Result<Self, ShowError> {
        let source = if program.is_generic() {
            program.pads().next()
        } else {
            program.track(pad).map(|_| pad)
        };
        let Some(source) = source else {
            return Err(ShowError::InvalidInput(format!(
                "program has no track for pad {}",
                pad
            )));
        };
        let bindings = BTreeMap::from([(pad, source)]);
        Ok(Self::with_bindings(program, bindings, actuator, config))
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Pads this handle drives when started
    pub fn pads(&self) -> impl Iterator<Item = Pad> + '_ {
        self.bindings.keys().copied()
    }

    pub fn binds(&self, pad: Pad) -> bool {
        self.bindings.contains_key(&pad)
    }

    /// True if a loop for `pad` has been started and not stopped
    pub fn is_playing(&self, pad: Pad) -> bool {
        self.loops.contains_key(&pad)
    }

    /// Actuator failure that ended the loop on `pad`, if any
    pub fn fault(&self, pad: Pad) -> Option<ActuatorError> {
        self.loops.get(&pad).and_then(PadLoop::fault)
    }

    /// Stop any running loops, then start every bound pad from loop-start
    pub fn start(&mut self) -> Result<(), ShowError> {
        self.start_excluding(&[])
    }

    /// Like [`start`](Self::start), but leave the `excluded` pads stopped
    pub fn start_excluding(&mut self, excluded: &[Pad]) -> Result<(), ShowError> {
        if let Err(err) = self.stop() {
            warn!("{} restarted after error: {}", self.id, err);
        }
        let pads: Vec<Pad> = self
            .pads()
            .filter(|pad| !excluded.contains(pad))
            .collect();
        for pad in pads {
            self.spawn(pad)?;
        }
        Ok(())
    }

    fn spawn(&mut self, pad: Pad) -> Result<(), ShowError> {
        let Some(&source) = self.bindings.get(&pad) else {
            return Ok(());
        };
        let pad_loop = PadLoop::spawn(
            self.actuator.clone(),
            pad,
            self.program.clone(),
            source,
            self.config,
        )?;
        self.loops.insert(pad, pad_loop);
        Ok(())
    }

    /// Stop every loop
    ///
    /// All loops are stopped even if some report errors; the first error is
    /// returned.
    pub fn stop(&mut self) -> Result<(), ShowError> {
        let mut first_error = None;
        for (_, mut pad_loop) in std::mem::take(&mut self.loops) {
            if let Err(err) = pad_loop.stop() {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stop the loop on `pad` only
    pub fn stop_pad(&mut self, pad: Pad) -> Result<(), ShowError> {
        match self.loops.remove(&pad) {
            Some(mut pad_loop) => pad_loop.stop(),
            None => Ok(()),
        }
    }

    /// Restart `pad` from loop-start if it is bound and not playing
    pub fn resume_pad(&mut self, pad: Pad) -> Result<(), ShowError> {
        if self.is_playing(pad) {
            return Ok(());
        }
        self.spawn(pad)
    }
}

impl fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackHandle")
            .field("id", &self.id)
            .field("bindings", &self.bindings)
            .field("playing", &self.loops.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use toypad_lstf::Rgb;

    use super::*;
    use crate::testing::{RecordingActuator, full_program, solid_program, wait_for};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn config() -> PlaybackConfig {
        PlaybackConfig {
            stop_poll_ms: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_track_ids_are_unique() {
        let actuator = RecordingActuator::new();
        let program = full_program(Rgb::WHITE, 0.05);
        let a = TrackHandle::for_program(program.clone(), actuator.clone(), config()).unwrap();
        let b = TrackHandle::for_program(program, actuator, config()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_for_program_rejects_generic() {
        let actuator = RecordingActuator::new();
        let generic = solid_program(&[Pad::Left], Rgb::WHITE, 0.05);
        assert!(matches!(
            TrackHandle::for_program(generic, actuator.clone(), config()),
            Err(ShowError::InvalidInput(_))
        ));
        let empty = Arc::new(Program::default());
        assert!(matches!(
            TrackHandle::for_program(empty, actuator, config()),
            Err(ShowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_for_pad_bindings() {
        let actuator = RecordingActuator::new();

        let generic = solid_program(&[Pad::Centre], Rgb::WHITE, 0.05);
        let handle = TrackHandle::for_pad(Pad::Right, generic, actuator.clone(), config()).unwrap();
        assert_eq!(handle.pads().collect::<Vec<_>>(), vec![Pad::Right]);

        let pair = solid_program(&[Pad::Centre, Pad::Left], Rgb::WHITE, 0.05);
        let handle = TrackHandle::for_pad(Pad::Left, pair.clone(), actuator.clone(), config()).unwrap();
        assert_eq!(handle.pads().collect::<Vec<_>>(), vec![Pad::Left]);

        assert!(matches!(
            TrackHandle::for_pad(Pad::Right, pair, actuator, config()),
            Err(ShowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stop_and_resume_pad() {
        let actuator = RecordingActuator::new();
        let mut handle =
            TrackHandle::for_program(full_program(Rgb::WHITE, 0.01), actuator.clone(), config())
                .unwrap();
        handle.start().unwrap();
        assert!(Pad::ALL.iter().all(|pad| handle.is_playing(*pad)));

        handle.stop_pad(Pad::Left).unwrap();
        assert!(!handle.is_playing(Pad::Left));
        let stopped_at = Instant::now();
        std::thread::sleep(Duration::from_millis(40));
        assert!(actuator.calls_for_since(Pad::Left, stopped_at).is_empty());
        assert!(!actuator.calls_for_since(Pad::Centre, stopped_at).is_empty());

        let resumed_at = Instant::now();
        handle.resume_pad(Pad::Left).unwrap();
        assert!(wait_for(TIMEOUT, || {
            !actuator.calls_for_since(Pad::Left, resumed_at).is_empty()
        }));

        handle.stop().unwrap();
        assert!(Pad::ALL.iter().all(|pad| !handle.is_playing(*pad)));
        // Resuming an unbound pad does nothing
        let mut single =
            TrackHandle::for_pad(Pad::Centre, full_program(Rgb::WHITE, 0.01), actuator, config())
                .unwrap();
        single.resume_pad(Pad::Right).unwrap();
        assert!(!single.is_playing(Pad::Right));
    }

    #[test]
    fn test_start_excluding() {
        let actuator = RecordingActuator::new();
        let mut handle =
            TrackHandle::for_program(full_program(Rgb::WHITE, 0.01), actuator, config()).unwrap();
        handle.start_excluding(&[Pad::Right]).unwrap();
        assert!(handle.is_playing(Pad::Centre));
        assert!(handle.is_playing(Pad::Left));
        assert!(!handle.is_playing(Pad::Right));
        handle.stop().unwrap();
    }
}
