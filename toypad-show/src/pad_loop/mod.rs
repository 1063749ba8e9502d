//! Per-pad loop workers
//!
//! A [`PadLoop`] owns one OS thread that replays a single pad's commands in
//! a repeating cycle until it is stopped. Stopping is synchronous: once
//! [`PadLoop::stop`] returns, the worker has exited and will make no more
//! actuator calls.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use toypad_lstf::{Pad, Program};
use tracing::{debug, warn};

use crate::actuator::PadActuator;
use crate::config::PlaybackConfig;
use crate::error::{ActuatorError, ShowError};
use crate::lock_or_recover;

mod worker;
#[cfg(test)]
mod tests;

use worker::PadLoopWorker;

/// State shared between a [`PadLoop`] and its worker thread
pub(super) struct LoopShared {
    /// Stop flag, signalled through `condvar`
    stopped: Mutex<bool>,
    condvar: Condvar,
    /// Actuator failure that ended the worker
    fault: Mutex<Option<ActuatorError>>,
}

impl LoopShared {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
            fault: Mutex::new(None),
        }
    }

    fn request_stop(&self) {
        *lock_or_recover(&self.stopped, "Pad loop stop") = true;
        self.condvar.notify_all();
    }

    pub(super) fn is_stopped(&self) -> bool {
        *lock_or_recover(&self.stopped, "Pad loop stop")
    }

    /// Block until `deadline` or a stop request, waking at least every
    /// `slice`. Returns `false` if stopped.
    pub(super) fn wait_until(&self, deadline: Instant, slice: Duration) -> bool {
        let mut stopped = lock_or_recover(&self.stopped, "Pad loop stop");
        loop {
            if *stopped {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _) = self
                .condvar
                .wait_timeout(stopped, (deadline - now).min(slice))
                .unwrap_or_else(|e| {
                    warn!("Pad loop condvar wait mutex poisoned; continuing");
                    e.into_inner()
                });
            stopped = guard;
        }
    }

    pub(super) fn record_fault(&self, err: ActuatorError) {
        *lock_or_recover(&self.fault, "Pad loop fault") = Some(err);
    }

    fn fault(&self) -> Option<ActuatorError> {
        lock_or_recover(&self.fault, "Pad loop fault").clone()
    }
}

/// Handle to a running pad loop worker
///
/// Dropping the handle stops the worker and waits for it to exit.
pub struct PadLoop {
    pad: Pad,
    shared: Arc<LoopShared>,
    handle: Option<JoinHandle<()>>,
}

impl PadLoop {
    /// Start replaying the `source` track of `program` on `pad`
    ///
    /// `source` differs from `pad` when a generic program is bound to a pad.
    /// The cycle is anchored at the moment the worker starts.
    pub fn spawn(
        actuator: Arc<dyn PadActuator>,
        pad: Pad,
        program: Arc<Program>,
        source: Pad,
        config: PlaybackConfig,
    ) -> Result<Self, ShowError> {
        if program.track(source).is_none() {
            return Err(ShowError::Internal(format!(
                "program has no {} track to play on pad {}",
                source, pad
            )));
        }

        let shared = Arc::new(LoopShared::new());
        let worker = PadLoopWorker {
            actuator,
            pad,
            program,
            source,
            shared: shared.clone(),
            poll_interval: config.stop_poll_interval(),
            min_loop_seconds: config.min_loop_period(),
        };

        let handle = thread::Builder::new()
            .name(format!("lstf-pad-loop[{}]", pad))
            .spawn(move || worker.run())
            .map_err(ShowError::Spawn)?;

        debug!("Started pad loop on {} (source track {})", pad, source);
        Ok(Self {
            pad,
            shared,
            handle: Some(handle),
        })
    }

    pub fn pad(&self) -> Pad {
        self.pad
    }

    /// True while the worker thread has not exited
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Actuator failure that ended the worker, if any
    pub fn fault(&self) -> Option<ActuatorError> {
        self.shared.fault()
    }

    /// Signal the worker to stop and wait for it to exit
    ///
    /// Idempotent. Reports the actuator failure that ended the worker, if
    /// there was one, on every call.
    pub fn stop(&mut self) -> Result<(), ShowError> {
        self.shared.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(ShowError::Internal(format!(
                    "pad loop worker for {} panicked",
                    self.pad
                )));
            }
            debug!("Stopped pad loop on {}", self.pad);
        }
        match self.shared.fault() {
            Some(err) => Err(ShowError::Actuator(err)),
            None => Ok(()),
        }
    }
}

impl Drop for PadLoop {
    fn drop(&mut self) {
        self.shared.request_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
