//! Cross-redirect persistence for the return path and last-known tokens.
//!
//! SYSTEM CONTEXT
//! ==============
//! Provider login and logout are full-page redirects, so every in-memory
//! signal is lost on the way back. The stash hands exactly two values across
//! that gap: where to go after login, and the token set needed to resume a
//! session after a forced reload.
//!
//! DESIGN
//! ======
//! The key set is closed (`StashKey`). Values are JSON; a missing backend, a
//! stored `null`, or a payload that fails to parse all read as absent.


pub mod storage;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub use self::storage::{MemoryStorage, SessionStorage, StorageBackend};

/// Prefix shared by every key this crate writes.
pub const STASH_NAMESPACE: &str = "keycloak-router";

/// The entries the stash knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StashKey {
    /// Path to return to once login completes.
    RedirectTo,
    /// Last token set reported by the provider.
    Tokens,
}

impl StashKey {
    pub const ALL: [Self; 2] = [Self::RedirectTo, Self::Tokens];

    /// Namespaced storage key.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::RedirectTo => "keycloak-router:redirectTo",
            Self::Tokens => "keycloak-router:tokens",
        }
    }
}

/// Raw token triple as reported by the provider. Any field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl TokenSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.refresh_token.is_none() && self.id_token.is_none()
    }
}

/// JSON key/value store over a tab-scoped backend.
#[derive(Clone, Debug, Default)]
pub struct Stash<S = SessionStorage> {
    backend: S,
}

impl<S: StorageBackend> Stash<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Serialize `value` and store it under `key`, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Propagates backend write failures (quota, access denied) and
    /// serialization failures.
    pub fn set<T: Serialize + ?Sized>(&self, key: StashKey, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.backend.set_item(key.storage_key(), &raw)
    }

    /// Read and decode the entry for `key`.
    pub fn get<T: DeserializeOwned>(&self, key: StashKey) -> Option<T> {
        let raw = self.backend.get_item(key.storage_key())?;
        let value = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Null) => return None,
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = key.storage_key(), error = %e, "ignoring malformed stash entry");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(key = key.storage_key(), error = %e, "ignoring mistyped stash entry");
                None
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: StashKey, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn delete(&self, key: StashKey) {
        self.backend.remove_item(key.storage_key());
    }

    /// Read then remove the entry. The entry is removed even when it fails to
    /// decode, so a corrupt value cannot linger.
    pub fn pop<T: DeserializeOwned>(&self, key: StashKey) -> Option<T> {
        let value = self.get(key);
        self.delete(key);
        value
    }

    pub fn pop_or<T: DeserializeOwned>(&self, key: StashKey, default: T) -> T {
        self.pop(key).unwrap_or(default)
    }

    // =============================================================
    // Typed accessors for the two live entries
    // =============================================================

    /// Remember where to go after login.
    ///
    /// # Errors
    ///
    /// Propagates storage write failures.
    pub fn set_redirect_to(&self, path: &str) -> Result<(), StorageError> {
        self.set(StashKey::RedirectTo, path)
    }

    pub fn redirect_to(&self) -> Option<String> {
        self.get(StashKey::RedirectTo)
    }

    /// Consume the stored return path, falling back to `fallback`.
    pub fn pop_redirect_to(&self, fallback: &str) -> String {
        self.pop_or(StashKey::RedirectTo, fallback.to_owned())
    }

    /// Record the latest token set.
    ///
    /// # Errors
    ///
    /// Propagates storage write failures.
    pub fn set_tokens(&self, tokens: &TokenSnapshot) -> Result<(), StorageError> {
        self.set(StashKey::Tokens, tokens)
    }

    pub fn pop_tokens(&self) -> Option<TokenSnapshot> {
        self.pop(StashKey::Tokens)
    }
}
