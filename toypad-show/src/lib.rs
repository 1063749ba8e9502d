//! Real-time playback of LSTF light shows
//!
//! Drives a [`PadActuator`] from decoded [`Program`](toypad_lstf::Program)s.
//! Each pad is played by its own loop worker thread, and a [`ShowEngine`]
//! decides which track owns each pad:
//!
//! - a default track plus a stack of pushed tracks (only the top plays)
//! - per-pad overlays that temporarily take a single pad
//!
//! ```no_run
//! use std::sync::Arc;
//! use toypad_show::{ShowConfig, ShowEngine, TrackCache};
//!
//! # fn run(actuator: Arc<dyn toypad_show::PadActuator>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ShowConfig::load_or_default("show.toml");
//! let cache = TrackCache::with_config(&config.cache);
//! let mut engine = ShowEngine::with_config(actuator, &config);
//! engine.activate_default(cache.load("tracks/aurora_glide.lstf")?)?;
//! let burst = engine.push_track(cache.load("tracks/countdown_burst.lstf")?)?;
//! engine.pop_track(burst)?;
//! engine.close();
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard};

use tracing::warn;

mod actuator;
mod cache;
mod config;
mod engine;
mod error;
mod pad_loop;
mod track;

#[cfg(test)]
mod testing;

pub use actuator::{PadActuator, PadTarget};
pub use cache::TrackCache;
pub use config::{CacheConfig, PlaybackConfig, ShowConfig};
pub use engine::ShowEngine;
pub use error::{ActuatorError, ShowError};
pub use pad_loop::PadLoop;
pub use track::{TrackHandle, TrackId};

/// Lock a mutex, recovering the data if another thread panicked
pub(crate) fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("{} mutex poisoned; continuing", what);
        e.into_inner()
    })
}
