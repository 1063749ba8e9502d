//! Show engine configuration (TOML)
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [playback]
//! stop_poll_ms = 100
//! min_loop_seconds = 0.01
//!
//! [cache]
//! canonicalize_paths = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ShowError;

/// Longest single wait inside a loop worker
const MAX_STOP_POLL_MS: u64 = 100;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ShowConfig {
    /// Loop worker timing
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Track cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Loop worker timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Upper bound on one wait slice in milliseconds (default: 100, range: 1-100)
    #[serde(default = "default_stop_poll_ms")]
    pub stop_poll_ms: u64,
    /// Floor applied to every loop period in seconds (default: 0.01)
    #[serde(default = "default_min_loop_seconds")]
    pub min_loop_seconds: f64,
}

/// Track cache behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Canonicalize paths before using them as cache keys (default: true)
    #[serde(default = "default_true")]
    pub canonicalize_paths: bool,
}

fn default_stop_poll_ms() -> u64 {
    MAX_STOP_POLL_MS
}
fn default_min_loop_seconds() -> f64 {
    toypad_lstf::MIN_TRACK_DURATION
}
fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            stop_poll_ms: default_stop_poll_ms(),
            min_loop_seconds: default_min_loop_seconds(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            canonicalize_paths: default_true(),
        }
    }
}

impl PlaybackConfig {
    /// Wait slice, clamped to 1..=100ms
    pub fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms.clamp(1, MAX_STOP_POLL_MS))
    }

    /// Minimum loop period; invalid values fall back to the default
    pub fn min_loop_period(&self) -> f64 {
        if self.min_loop_seconds.is_finite() && self.min_loop_seconds > 0.0 {
            self.min_loop_seconds
        } else {
            default_min_loop_seconds()
        }
    }
}

impl ShowConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ShowError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShowError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ShowError::ConfigRead)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, using defaults if the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                debug!("Using default show config ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }
}
