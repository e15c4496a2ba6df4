//! Durable key-value persistence for client state.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the backend seam: raw string values under string keys
//! - [`PersistentStore`] is the typed adapter every component talks to; it
//!   encodes values as JSON and treats unreadable data as absent
//! - [`FileStore`] persists one JSON file per key and survives restarts
//! - [`MemoryStore`] keeps everything in process, for tests and ephemeral sessions
//!
//! Each key is a single shared slot. Two adapters over the same backend see
//! each other's writes only when they re-read; there is no cross-instance
//! coordination and the last write wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Keys owned by the storefront client.
pub mod keys {
    /// Serialized cart snapshot. Written only by the cart manager.
    pub const CART: &str = "cart";

    /// Serialized list of placed orders.
    pub const ORDERS: &str = "orders";

    /// Opaque id of the logged-in user.
    pub const USER_ID: &str = "userId";

    /// Opaque auth token of the logged-in user.
    pub const TOKEN: &str = "token";
}

/// Errors that can occur when persisting values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters the backend cannot store.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A writer panicked while holding the backend lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Raw key-value backend.
///
/// Implementations must be thread-safe (`Send + Sync`) and take `&self` so a
/// single backend can be shared by the cart, order history and session.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed adapter over a [`KeyValueStore`] backend.
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistentStore {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Adapter over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Serialize `value` as JSON and persist it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value)?;
        self.backend.put_raw(key, &encoded)
    }

    /// Read and decode the value under `key`.
    ///
    /// Returns `None` when the key was never written, was cleared, cannot be
    /// read, or holds data that does not decode as `T`.
    #[must_use]
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_raw(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored value, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Malformed stored value, treating as absent");
                None
            }
        }
    }

    /// Remove any value under `key`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }

    /// Whether anything is stored under `key`, decodable or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.backend.get_raw(key), Ok(Some(_)))
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore").finish_non_exhaustive()
    }
}
