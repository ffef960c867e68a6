//! Application configuration management.
//!
//! The configuration selects which storage backend holds the session and,
//! for file storage, where the storage file lives.
//!
//! Configuration is stored at `~/.config/creditscore/config.json`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, StorageError};
use crate::storage::{FileStorage, KeyValueStore, KeyringStorage, MemoryStorage};
use crate::APP_NAME;

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Keyring,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::File => "file",
            StorageBackend::Keyring => "keyring",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: StorageBackend,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, contents).map_err(write_err)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory used by file storage
    pub fn data_dir(&self) -> Result<PathBuf, StorageError> {
        match self.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => FileStorage::default_dir(),
        }
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        let storage: Box<dyn KeyValueStore> = match self.backend {
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
            StorageBackend::File => Box::new(FileStorage::new(self.data_dir()?)),
            StorageBackend::Keyring => Box::new(KeyringStorage::new()),
        };
        debug!(backend = %self.backend, "Storage backend opened");
        Ok(storage)
    }
}
