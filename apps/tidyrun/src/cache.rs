//! Persistent analyzer output cache.
//!
//! One JSON store per build folder (`clang-tidy-store.json`) maps a source
//! key to the analyzer output, the run duration, and `time`: the newest
//! modification time of the inputs (compiled config and source) when the
//! result was produced. An entry is valid while
//! `time >= max(mtime(config), mtime(source))`.
//!
//! The store is read in full before every lookup and rewritten in full after
//! every store. There is no locking: only one process may use a store at a
//! time. A missing or unreadable store is an empty cache.

use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

pub const STORE_FILE_NAME: &str = "clang-tidy-store.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One persisted analyzer result.
pub struct CacheEntry {
    /// Seconds since the epoch; see module docs.
    pub time: f64,
    pub output: String,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// A valid hit returned by [`AnalysisCache::lookup`].
pub struct CachedRun {
    pub output: String,
    pub duration: f64,
}

type Store = BTreeMap<String, CacheEntry>;

/// Modification time in seconds since the epoch, if the file exists.
pub fn mtime(path: &Path) -> Option<f64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_secs_f64())
}

/// Handle on one build folder's store; constructed once per run.
pub struct AnalysisCache {
    store_path: PathBuf,
    config_path: PathBuf,
}

impl AnalysisCache {
    pub fn new(build_dir: &Path, config_path: &Path) -> Self {
        Self {
            store_path: build_dir.join(STORE_FILE_NAME),
            config_path: config_path.to_path_buf(),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Newest mtime of the compiled config and `source`.
    ///
    /// `None` when either is missing, which makes every entry stale.
    pub fn input_time(&self, source: &Path) -> Option<f64> {
        let config = mtime(&self.config_path)?;
        let src = mtime(source)?;
        Some(config.max(src))
    }

    fn read(&self) -> Store {
        let text = match fs::read_to_string(&self.store_path) {
            Ok(t) => t,
            Err(_) => return Store::new(),
        };
        match serde_json::from_str(&text) {
            Ok(store) => store,
            Err(e) => {
                log::warn!(
                    "cache store {} is corrupt, starting empty: {}",
                    self.store_path.display(),
                    e
                );
                Store::new()
            }
        }
    }

    fn write(&self, store: &Store) -> Result<()> {
        let mut text = serde_json::to_string_pretty(store)
            .map_err(|e| TidyError::io(&self.store_path, std::io::Error::other(e)))?;
        text.push('\n');
        fs::write(&self.store_path, text).map_err(|e| TidyError::io(&self.store_path, e))
    }

    /// Cached output for `key` if it is still valid for `source`.
    pub fn lookup(&self, key: &str, source: &Path) -> Option<CachedRun> {
        let store = self.read();
        let entry = store.get(key)?;
        let Some(newest) = self.input_time(source) else {
            log::debug!("cache miss (inputs missing): {}", key);
            return None;
        };
        if entry.time >= newest {
            log::debug!("cache hit: {}", key);
            Some(CachedRun {
                output: entry.output.clone(),
                duration: entry.duration,
            })
        } else {
            log::debug!("cache stale: {}", key);
            None
        }
    }

    /// Persist a result computed from inputs whose newest mtime was `time`.
    pub fn store(&mut self, key: &str, time: f64, output: &str, duration: f64) -> Result<()> {
        let mut store = self.read();
        store.insert(
            key.to_string(),
            CacheEntry {
                time,
                output: output.to_string(),
                duration,
            },
        );
        self.write(&store)?;
        log::debug!(
            "cached {} ({} entries in {})",
            key,
            store.len(),
            self.store_path.display()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
