#![doc(test(attr(deny(warnings))))]

//! Ledger Tracker keeps a personal list of incomes and expenses, the running
//! balance they add up to, and a durable copy of both that survives restarts.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

pub use crate::core::{ClearScope, LedgerEvent, LedgerStore, LoadReport, Prompter};
pub use domain::{Entry, EntryKind, LedgerState, Money};
pub use errors::{LedgerError, ValidationError};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Tracker tracing initialized.");
    });
}
