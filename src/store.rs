//! Local JSON store for the performance cache, custom dates and manual sheet.
//!
//! Each key maps to one `<key>.json` file in the store directory. A missing
//! file reads as the type's default value. Writes go to a temp file in the
//! same directory and are renamed into place, so an interrupted write never
//! leaves a truncated file behind.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::config;
use crate::error::{Result, TrackerError};

/// Reads and writes opaque JSON blobs under fixed keys.
pub struct Store {
    /// Directory where store files live.
    pub dir: PathBuf,
}

impl Store {
    /// Open a store.
    ///
    /// If `dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the directory if it does not exist.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let dir = dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if !config::STORE_KEYS.contains(&key) {
            return Err(TrackerError::NotFound(format!("Unknown store key: {}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Whether a value has been saved under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.path(key).map(|p| p.exists()).unwrap_or(false)
    }

    /// Load the value stored under `key`, or the default if nothing is stored.
    ///
    /// If the stored file is corrupt it is deleted so the next save starts
    /// clean, and `CorruptStore` is returned.
    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let path = self.path(key)?;
        if !path.exists() {
            return Ok(T::default());
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt store file, removing");
                let _ = fs::remove_file(&path);
                Err(TrackerError::CorruptStore {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Save `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, value)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| TrackerError::Io(e.error))?;
        Ok(())
    }

    /// Delete the value stored under `key`, if any.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove all stored files and recreate the store directory.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}
