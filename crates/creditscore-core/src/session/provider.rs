use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::store::{Credentials, SessionSnapshot, SessionStore};
use crate::error::SessionError;
use crate::storage::KeyValueStore;

/// Owns the session store for one application run.
///
/// Build one at startup and pass handles to whatever needs the session.
/// Handles only borrow the store: once the provider is dropped every handle
/// call fails with `SessionError::OutOfScope`.
pub struct SessionProvider<S = Box<dyn KeyValueStore>> {
    store: Rc<RefCell<SessionStore<S>>>,
}

impl<S: KeyValueStore> SessionProvider<S> {
    /// Initialize a store over `storage` and take ownership of it
    pub fn new(storage: S) -> Self {
        Self::from_store(SessionStore::initialize(storage))
    }

    /// Run `f` with a handle to a freshly initialized session, ending the
    /// provider scope when `f` returns.
    pub fn provide<R>(storage: S, f: impl FnOnce(SessionHandle<S>) -> R) -> R {
        let provider = Self::new(storage);
        f(provider.handle())
    }
}

impl<S> SessionProvider<S> {
    pub fn from_store(store: SessionStore<S>) -> Self {
        Self {
            store: Rc::new(RefCell::new(store)),
        }
    }

    pub fn handle(&self) -> SessionHandle<S> {
        SessionHandle {
            store: Rc::downgrade(&self.store),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.borrow().snapshot()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.borrow().is_persistent()
    }
}

/// Access to the session from inside a provider's scope.
pub struct SessionHandle<S = Box<dyn KeyValueStore>> {
    store: Weak<RefCell<SessionStore<S>>>,
}

impl<S> Clone for SessionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> SessionHandle<S> {
    /// Whether the provider this handle came from is still alive
    pub fn is_in_scope(&self) -> bool {
        self.store.strong_count() > 0
    }

    fn scoped(&self) -> Result<Rc<RefCell<SessionStore<S>>>, SessionError> {
        self.store.upgrade().ok_or(SessionError::OutOfScope)
    }

    fn read<R>(&self, f: impl FnOnce(&SessionStore<S>) -> R) -> Result<R, SessionError> {
        let store = self.scoped()?;
        let store = store.borrow();
        Ok(f(&store))
    }

    pub fn token(&self) -> Result<Option<String>, SessionError> {
        self.read(|s| s.token().map(str::to_string))
    }

    pub fn username(&self) -> Result<Option<String>, SessionError> {
        self.read(|s| s.username().map(str::to_string))
    }

    pub fn is_authenticated(&self) -> Result<bool, SessionError> {
        self.read(|s| s.is_authenticated())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.read(|s| s.snapshot())
    }
}

impl<S: KeyValueStore> SessionHandle<S> {
    pub fn login(&self, credentials: Credentials) -> Result<(), SessionError> {
        self.scoped()?.borrow_mut().login(credentials);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.scoped()?.borrow_mut().logout();
        Ok(())
    }
}
