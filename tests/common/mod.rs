#![allow(dead_code)]

use ledger_tracker::{
    core::ScriptedPrompter, ClearScope, KeyValueStore, LedgerStore, MemoryStore,
};

/// Opens a ledger over `storage` with a prompter that answers `answer`.
pub fn open_store<S>(storage: S, answer: bool) -> (LedgerStore, ScriptedPrompter)
where
    S: KeyValueStore + 'static,
{
    let prompter = ScriptedPrompter::answering(answer);
    let (store, _report) =
        LedgerStore::open(Box::new(storage), Box::new(prompter.clone())).expect("open store");
    (store, prompter)
}

/// Fresh in-memory ledger plus a handle on its backing map.
pub fn memory_store(answer: bool) -> (LedgerStore, MemoryStore, ScriptedPrompter) {
    let storage = MemoryStore::new();
    let (store, prompter) = open_store(storage.clone(), answer);
    (store, storage, prompter)
}

/// Reloads whatever `storage` holds into a brand new store.
pub fn reopen(storage: &MemoryStore) -> LedgerStore {
    open_store(storage.clone(), false).0
}

pub fn with_scope(store: LedgerStore, scope: ClearScope) -> LedgerStore {
    store.with_clear_scope(scope)
}
