use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use super::{KeyValueStore, Result, StorageError};

/// In-memory store for tests and throwaway sessions.
///
/// Clones share the same map, so a second ledger store built from a clone
/// sees everything the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        map.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let map = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.keys().cloned().collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set("saldo", "10").expect("set");
        assert_eq!(handle.get("saldo").expect("get").as_deref(), Some("10"));
        handle.clear().expect("clear");
        assert!(store.is_empty());
    }
}
