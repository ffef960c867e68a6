//! Local key-value storage backends.
//!
//! The session store persists two flat string values. Any backend that can
//! get, set and remove a string by key can hold them:
//! - `MemoryStorage`: in-process map, used for tests and memory-only runs
//! - `FileStorage`: a JSON document in the local data directory
//! - `KeyringStorage`: one OS keychain entry per key

pub mod file;
pub mod keychain;
pub mod memory;

pub use self::file::FileStorage;
pub use self::keychain::KeyringStorage;
pub use self::memory::MemoryStorage;

use crate::error::StorageError;

/// Flat string key-value storage that survives an application restart.
///
/// Removing a key that is not present is not an error.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
