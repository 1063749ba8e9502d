//! Show engine
//!
//! Arbitrates which track drives each pad. Control is layered, outermost
//! wins:
//!
//! - **Stack**: the default track sits at the bottom, pushed tracks above
//!   it. Only the top entry plays; pushing suspends the previous top and
//!   popping restarts it from loop-start.
//! - **Overlays**: at most one per pad. An overlay replaces the stack top's
//!   loop on its pad; the other pads keep playing. Removing it restarts the
//!   stack top's loop for that pad from loop-start.
//!
//! At most one loop worker drives a pad at any time.

use std::collections::BTreeMap;
use std::sync::Arc;

use toypad_lstf::{Pad, Program};
use tracing::{info, warn};

use crate::actuator::PadActuator;
use crate::config::{PlaybackConfig, ShowConfig};
use crate::error::{ActuatorError, ShowError};
use crate::track::{TrackHandle, TrackId};

#[cfg(test)]
mod tests;

/// Layered playback controller for the three pads
///
/// Operations take `&mut self`; share the engine behind a `Mutex` when
/// several trigger sources drive it.
pub struct ShowEngine {
    actuator: Arc<dyn PadActuator>,
    config: PlaybackConfig,
    stack: Vec<TrackHandle>,
    overlays: BTreeMap<Pad, TrackHandle>,
}

impl ShowEngine {
    /// Engine with default configuration
    pub fn new(actuator: Arc<dyn PadActuator>) -> Self {
        Self::with_config(actuator, &ShowConfig::default())
    }

    pub fn with_config(actuator: Arc<dyn PadActuator>, config: &ShowConfig) -> Self {
        Self {
            actuator,
            config: config.playback,
            stack: Vec::new(),
            overlays: BTreeMap::new(),
        }
    }

    fn overlaid_pads(&self) -> Vec<Pad> {
        self.overlays.keys().copied().collect()
    }

    fn stop_handle(handle: &mut TrackHandle) {
        if let Err(err) = handle.stop() {
            warn!("{} stopped with error: {}", handle.id(), err);
        }
    }

    /// Start `handle` on every pad without an overlay and push it
    fn start_on_top(&mut self, mut handle: TrackHandle) -> Result<TrackId, ShowError> {
        handle.start_excluding(&self.overlaid_pads())?;
        let id = handle.id();
        self.stack.push(handle);
        Ok(id)
    }

    /// Restart the stack top from loop-start, leaving overlaid pads alone
    fn restart_top(&mut self) -> Result<(), ShowError> {
        let overlaid = self.overlaid_pads();
        match self.stack.last_mut() {
            Some(top) => top.start_excluding(&overlaid),
            None => Ok(()),
        }
    }

    fn stop_stack(&mut self) {
        while let Some(mut handle) = self.stack.pop() {
            Self::stop_handle(&mut handle);
        }
    }

    /// Install `program` as the base track, discarding the whole stack
    ///
    /// Overlays are kept and continue to own their pads.
    ///
    /// # Errors
    ///
    /// `InvalidInput` unless the program defines all three pads.
    pub fn activate_default(&mut self, program: Arc<Program>) -> Result<TrackId, ShowError> {
        if !program.is_full() {
            return Err(ShowError::InvalidInput(format!(
                "default track must define all three pads (got {} pads)",
                program.len()
            )));
        }
        let handle = TrackHandle::for_program(program, self.actuator.clone(), self.config)?;
        self.stop_stack();
        let id = self.start_on_top(handle)?;
        info!("Activated default track {}", id);
        Ok(id)
    }

    /// Suspend the current top and play `program` above it
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the program is generic.
    pub fn push_track(&mut self, program: Arc<Program>) -> Result<TrackId, ShowError> {
        let handle = TrackHandle::for_program(program, self.actuator.clone(), self.config)?;
        if let Some(top) = self.stack.last_mut() {
            Self::stop_handle(top);
        }
        match self.start_on_top(handle) {
            Ok(id) => {
                info!("Pushed track {} (stack depth {})", id, self.stack.len());
                Ok(id)
            }
            Err(err) => {
                self.restart_top()?;
                Err(err)
            }
        }
    }

    /// Discard the whole stack, then push `program`
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the program is generic.
    pub fn replace_track(&mut self, program: Arc<Program>) -> Result<TrackId, ShowError> {
        let handle = TrackHandle::for_program(program, self.actuator.clone(), self.config)?;
        self.stop_stack();
        let id = self.start_on_top(handle)?;
        info!("Replaced track stack with {}", id);
        Ok(id)
    }

    /// Pop `id` if it is the stack top and restart the entry below it
    ///
    /// Returns `Ok(false)` without touching anything when `id` is not the
    /// top (already popped or superseded).
    pub fn pop_track(&mut self, id: TrackId) -> Result<bool, ShowError> {
        if self.top() != Some(id) {
            return Ok(false);
        }
        if let Some(mut handle) = self.stack.pop() {
            Self::stop_handle(&mut handle);
        }
        info!("Popped track {} (stack depth {})", id, self.stack.len());
        self.restart_top()?;
        Ok(true)
    }

    /// Give `pad` to `program` until the overlay is removed
    ///
    /// A generic program plays its only track on `pad`; a multi-pad program
    /// plays its own `pad` track. Other pads are not affected.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a multi-pad program has no track for `pad`.
    pub fn apply_overlay(&mut self, pad: Pad, program: Arc<Program>) -> Result<TrackId, ShowError> {
        let mut handle = TrackHandle::for_pad(pad, program, self.actuator.clone(), self.config)?;

        if let Some(mut previous) = self.overlays.remove(&pad) {
            Self::stop_handle(&mut previous);
        }
        if let Some(top) = self.stack.last_mut()
            && let Err(err) = top.stop_pad(pad)
        {
            warn!("{} stopped on {} with error: {}", top.id(), pad, err);
        }

        let id = handle.id();
        if let Err(err) = handle.start() {
            if let Some(top) = self.stack.last_mut() {
                top.resume_pad(pad)?;
            }
            return Err(err);
        }
        self.overlays.insert(pad, handle);
        info!("Applied overlay {} on {}", id, pad);
        Ok(id)
    }

    /// Remove the overlay on `pad` and restart the stack top on that pad
    ///
    /// Returns whether an overlay was removed.
    pub fn remove_overlay(&mut self, pad: Pad) -> Result<bool, ShowError> {
        let removed = match self.overlays.remove(&pad) {
            Some(mut handle) => {
                Self::stop_handle(&mut handle);
                info!("Removed overlay {} from {}", handle.id(), pad);
                true
            }
            None => false,
        };
        if let Some(top) = self.stack.last_mut() {
            top.resume_pad(pad)?;
        }
        Ok(removed)
    }

    /// Remove every overlay, returning each pad to the stack top
    pub fn clear_overlays(&mut self) -> Result<(), ShowError> {
        for pad in self.overlaid_pads() {
            self.remove_overlay(pad)?;
        }
        Ok(())
    }

    /// Stop all overlays and stack entries
    ///
    /// Idempotent; the engine can be reused afterwards.
    pub fn close(&mut self) {
        if self.overlays.is_empty() && self.stack.is_empty() {
            return;
        }
        for (_, mut handle) in std::mem::take(&mut self.overlays) {
            Self::stop_handle(&mut handle);
        }
        self.stop_stack();
        info!("Show engine closed");
    }

    /// Track at the top of the stack
    pub fn top(&self) -> Option<TrackId> {
        self.stack.last().map(TrackHandle::id)
    }

    /// Number of stack entries, including the default track
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Overlay currently applied to `pad`
    pub fn overlay(&self, pad: Pad) -> Option<TrackId> {
        self.overlays.get(&pad).map(TrackHandle::id)
    }

    /// Track currently driving `pad`, if a loop is playing on it
    pub fn controller(&self, pad: Pad) -> Option<TrackId> {
        if let Some(overlay) = self.overlays.get(&pad) {
            return overlay.is_playing(pad).then_some(overlay.id());
        }
        self.stack
            .last()
            .filter(|top| top.is_playing(pad))
            .map(TrackHandle::id)
    }

    /// Actuator failure that ended the loop currently assigned to `pad`
    pub fn pad_fault(&self, pad: Pad) -> Option<ActuatorError> {
        match self.overlays.get(&pad) {
            Some(overlay) => overlay.fault(pad),
            None => self.stack.last().and_then(|top| top.fault(pad)),
        }
    }
}

impl Drop for ShowEngine {
    fn drop(&mut self) {
        self.close();
    }
}
