//! Decoded track cache
//!
//! Programs are decoded once per identity and shared as `Arc<Program>` for
//! the life of the cache. Concurrent lookups are allowed; two threads that
//! miss on the same identity may both decode, and the first stored result
//! wins.

use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use toypad_lstf::{LstfError, Program, load_lstf};
use tracing::debug;

use crate::config::CacheConfig;
use crate::lock_or_recover;

/// Memoised program decoding keyed by `K`
pub struct TrackCache<K = PathBuf> {
    programs: Mutex<HashMap<K, Arc<Program>>>,
    canonicalize_paths: bool,
}

impl<K> Default for TrackCache<K> {
    fn default() -> Self {
        Self {
            programs: Mutex::new(HashMap::new()),
            canonicalize_paths: true,
        }
    }
}

impl<K: Hash + Eq> TrackCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the program stored for `identity`, decoding it with `loader`
    /// on a miss
    ///
    /// Loader errors are returned unchanged and nothing is stored.
    pub fn get<F>(&self, identity: K, loader: F) -> Result<Arc<Program>, LstfError>
    where
        F: FnOnce(&K) -> Result<Program, LstfError>,
    {
        if let Some(program) = lock_or_recover(&self.programs, "Track cache").get(&identity) {
            return Ok(program.clone());
        }

        let program = Arc::new(loader(&identity)?);
        let mut programs = lock_or_recover(&self.programs, "Track cache");
        Ok(programs.entry(identity).or_insert(program).clone())
    }

    pub fn contains(&self, identity: &K) -> bool {
        lock_or_recover(&self.programs, "Track cache").contains_key(identity)
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.programs, "Track cache").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock_or_recover(&self.programs, "Track cache").clear();
    }
}

impl TrackCache<PathBuf> {
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            programs: Mutex::new(HashMap::new()),
            canonicalize_paths: config.canonicalize_paths,
        }
    }

    /// Load a track file (binary or text envelope), decoding it at most once
    /// per resolved path
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Program>, LstfError> {
        let path = path.as_ref();
        let resolved = if self.canonicalize_paths {
            std::fs::canonicalize(path)?
        } else {
            path.to_path_buf()
        };
        self.get(resolved, |resolved| {
            debug!("Decoding track {}", resolved.display());
            load_lstf(resolved)
        })
    }
}
