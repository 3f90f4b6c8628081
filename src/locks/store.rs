//! Per-object lock overrides.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::world::Dbref;

/// Source of per-object lock keys. Must be safe to share across sessions.
pub trait LockStore: Send + Sync {
    /// The key `object` has set for `lock_name`, if any.
    fn get(&self, object: Dbref, lock_name: &str) -> Option<String>;
}

/// Thread-safe in-memory override table keyed by object and
/// case-insensitive lock name.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    keys: RwLock<HashMap<(Dbref, String), String>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, object: Dbref, lock_name: &str, key: &str) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert((object, lock_name.to_lowercase()), key.to_string());
        }
    }

    /// Drop an override; returns the key that was removed.
    pub fn remove(&self, object: Dbref, lock_name: &str) -> Option<String> {
        self.keys
            .write()
            .ok()?
            .remove(&(object, lock_name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockStore for InMemoryLockStore {
    fn get(&self, object: Dbref, lock_name: &str) -> Option<String> {
        self.keys
            .read()
            .ok()?
            .get(&(object, lock_name.to_lowercase()))
            .cloned()
    }
}
