//! Authentication session state.
//!
//! This module provides:
//! - `SessionStore`: token and username held in memory, written through to
//!   a `KeyValueStore` so the session survives a restart
//! - `SessionProvider` / `SessionHandle`: the explicit context object that
//!   owns the store for one application run and hands out access to views
//!
//! Tokens are opaque. Nothing here verifies, parses or refreshes them.

pub mod provider;
pub mod store;

pub use provider::{SessionHandle, SessionProvider};
pub use store::{Credentials, SessionSnapshot, SessionStore, TOKEN_KEY, USERNAME_KEY};
