//! Key-value storage backends for the cart.

use std::collections::HashMap;

/// The backing storage cannot be written.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cart storage is unavailable")]
pub struct StorageUnavailable;

/// String key-value storage, modelled on browser local storage.
pub trait CartStorage {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageUnavailable`] when the backend cannot persist.
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageUnavailable>;
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with a single entry.
    #[must_use]
    pub fn with_item(key: &str, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.into());
        Self { entries }
    }

    /// Take the value stored under `key`, leaving nothing behind.
    pub fn take_item(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

impl CartStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageUnavailable> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Storage that holds nothing and refuses writes.
///
/// Used where no per-visitor storage exists, such as rendering for a visitor
/// without a session. The cart then always reads as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl CartStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_item(&mut self, _key: &str, _value: String) -> Result<(), StorageUnavailable> {
        Err(StorageUnavailable)
    }
}
