//! Value types shared by the store, the persisted codec and the shell.

pub mod entry;
pub mod money;
pub mod state;

pub use entry::{Entry, EntryKind, UnknownEntryKind};
pub use money::{Money, MAX_CENTS};
pub use state::LedgerState;
