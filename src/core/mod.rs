//! Ledger state machine and the capabilities it is wired to.

pub mod codec;
pub mod events;
pub mod ledger_store;
pub mod prompter;

pub use codec::LoadReport;
pub use events::{EventFeed, LedgerEvent};
pub use ledger_store::{ClearScope, LedgerStore, CLEAR_ALL_PROMPT};
pub use prompter::{Prompter, ScriptedPrompter, Transcript};
