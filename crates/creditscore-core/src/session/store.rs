use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SessionError, StorageError};
use crate::storage::KeyValueStore;

/// Storage key holding the session token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the display name of the current user
pub const USERNAME_KEY: &str = "username";

/// A token and username pair, as produced by the backend login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    username: String,
}

impl Credentials {
    /// Both fields must be non-empty; whitespace alone counts as empty.
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();
        let username = username.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyField(TOKEN_KEY));
        }
        if username.trim().is_empty() {
            return Err(SessionError::EmptyField(USERNAME_KEY));
        }
        Ok(Self { token, username })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Read-only copy of the session handed out to views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub username: Option<String>,
    pub is_authenticated: bool,
}

/// Holds the authentication state for one application run.
///
/// Construction reads the persisted pair, so a store is always initialized.
/// `login` and `logout` write through to storage before updating memory. If
/// the storage backend fails, the store logs it and keeps going in
/// memory-only mode for the rest of the run.
pub struct SessionStore<S> {
    storage: S,
    credentials: Option<Credentials>,
    persistent: bool,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Load the session persisted in `storage`.
    ///
    /// A token without a username (or the reverse) loads as anonymous.
    pub fn initialize(storage: S) -> Self {
        let mut store = Self {
            storage,
            credentials: None,
            persistent: true,
        };

        match store.load_persisted() {
            Ok(credentials) => {
                debug!(authenticated = credentials.is_some(), "Session loaded");
                store.credentials = credentials;
            }
            Err(e) => store.degrade("load", e),
        }
        store
    }

    fn load_persisted(&self) -> Result<Option<Credentials>, StorageError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let username = self.storage.get(USERNAME_KEY)?;

        match (token, username) {
            (Some(token), Some(username)) => Ok(Credentials::new(token, username).ok()),
            (Some(_), None) => {
                debug!("Stored token has no username, starting anonymous");
                Ok(None)
            }
            (None, Some(_)) => {
                debug!("Stored username has no token, starting anonymous");
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Replace the current session with `credentials`.
    pub fn login(&mut self, credentials: Credentials) {
        if self.persistent {
            if let Err(e) = self.persist(&credentials) {
                // Never leave a half-written pair behind
                if let Err(cleanup) = self.erase() {
                    warn!(error = %cleanup, "Failed to clear partially written session");
                }
                self.degrade("login", e);
            }
        }
        info!(username = %credentials.username, "Logged in");
        self.credentials = Some(credentials);
    }

    /// The token is dropped first and written last, so storage only ever
    /// holds a token next to the username it was issued with.
    fn persist(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.set(USERNAME_KEY, &credentials.username)?;
        self.storage.set(TOKEN_KEY, &credentials.token)?;
        Ok(())
    }

    /// Clear the session. Does nothing observable when already anonymous.
    pub fn logout(&mut self) {
        if self.persistent {
            if let Err(e) = self.erase() {
                self.degrade("logout", e);
            }
        }
        if let Some(previous) = self.credentials.take() {
            info!(username = %previous.username, "Logged out");
        }
    }

    /// Attempts both removals even if the first fails; a lone key left
    /// behind loads as anonymous.
    fn erase(&self) -> Result<(), StorageError> {
        let token = self.storage.remove(TOKEN_KEY);
        let username = self.storage.remove(USERNAME_KEY);
        token.and(username)
    }

    fn degrade(&mut self, operation: &str, error: StorageError) {
        warn!(operation, error = %error, "Session storage unavailable, continuing in memory only");
        self.persistent = false;
    }
}

impl<S> SessionStore<S> {
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Whether changes are still written to storage
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token().map(str::to_string),
            username: self.username().map(str::to_string),
            is_authenticated: self.is_authenticated(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

// ============================================================================
// Tests
// ============================================================================
