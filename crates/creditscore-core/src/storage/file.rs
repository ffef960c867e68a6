use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::KeyValueStore;
use crate::error::StorageError;
use crate::APP_NAME;

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Storage kept as a single JSON document on disk.
///
/// The file is re-read on every access and rewritten on every change, so two
/// instances pointed at the same directory observe each other's writes.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage in the platform's local data directory
    pub fn in_default_dir() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_dir()?))
    }

    pub fn default_dir() -> Result<PathBuf, StorageError> {
        let data_dir = dirs::data_local_dir().ok_or(StorageError::DataDirUnavailable)?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// When the document was last written, if ever
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.read()?.updated_at)
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn read(&self) -> Result<StorageDocument, StorageError> {
        let path = self.storage_path();
        if !path.exists() {
            return Ok(StorageDocument::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write to a temp file in the same directory and rename it over the
    /// old document, so a crash never leaves a truncated file. Temp files
    /// are created owner-only (0600 on unix) and keep that mode.
    fn write(&self, mut doc: StorageDocument) -> Result<(), StorageError> {
        let path = self.storage_path();
        std::fs::create_dir_all(&self.dir)?;
        doc.updated_at = Some(Utc::now());
        let contents = serde_json::to_string_pretty(&doc)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(?path, entries = doc.entries.len(), "Storage file written");
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut doc = self.read()?;
        doc.entries.insert(key.to_string(), value.to_string());
        self.write(doc)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut doc = self.read()?;
        if doc.entries.remove(key).is_some() {
            self.write(doc)?;
        }
        Ok(())
    }
}
