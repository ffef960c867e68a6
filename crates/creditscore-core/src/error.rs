use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the session store and its handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session accessed outside of its provider scope")]
    OutOfScope,

    #[error("Missing required field: {0}")]
    EmptyField(&'static str),
}

impl SessionError {
    /// Whether this error indicates a wiring bug in the calling code
    /// rather than bad input.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, SessionError::OutOfScope)
    }
}

/// Errors raised by a key-value storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Could not find a data directory for local storage")]
    DataDirUnavailable,

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find config directory")]
    ConfigDirUnavailable,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors() {
        assert!(SessionError::OutOfScope.is_usage_error());
        assert!(!SessionError::EmptyField("token").is_usage_error());
    }

    #[test]
    fn test_empty_field_message() {
        assert_eq!(
            SessionError::EmptyField("username").to_string(),
            "Missing required field: username"
        );
    }
}
