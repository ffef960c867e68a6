//! Core library for creditscore.
//!
//! Holds the client-side authentication session: a token and username kept
//! in memory and persisted to local key-value storage so a restart picks the
//! session back up.

pub mod config;
pub mod error;
pub mod session;
pub mod storage;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "creditscore";

pub use config::{Config, StorageBackend};
pub use error::{ConfigError, SessionError, StorageError};
pub use session::{Credentials, SessionHandle, SessionProvider, SessionSnapshot, SessionStore};
pub use storage::{FileStorage, KeyValueStore, KeyringStorage, MemoryStorage};
