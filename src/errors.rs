use thiserror::Error;

use crate::{domain::EntryKind, storage::StorageError};

/// User-correctable input problems. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in the description.")]
    EmptyDescription,
    #[error("Please enter a valid amount greater than zero.")]
    InvalidAmount,
    #[error("No {kind} entry at index {index} (there are {len}).")]
    IndexOutOfRange {
        kind: EntryKind,
        index: usize,
        len: usize,
    },
}

/// Error type returned by ledger store operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Ledger not loaded")]
    NotLoaded,
}

impl LedgerError {
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            LedgerError::Validation(err) => Some(err),
            _ => None,
        }
    }
}
