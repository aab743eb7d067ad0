pub mod json_backend;
pub mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use json_backend::{BackupInfo, JsonFileStore};
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures raised by persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("{0}")]
    NotFound(String),
    #[error("`{0}` is not a backup name")]
    InvalidName(String),
}

/// Durable string-to-string store the ledger persists into.
///
/// Methods take `&self`; backends synchronise internally so a handle can be
/// shared between several stores.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Erases every key, including ones the ledger does not own.
    fn clear(&self) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;

    /// Writes several keys. Backends that can commit them together override this.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        (**self).set_many(entries)
    }
}
