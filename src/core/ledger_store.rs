use std::{fmt, str::FromStr, sync::mpsc::Receiver};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    core::{
        codec::{self, LoadReport, BALANCE_KEY, EXPENSES_KEY, INCOMES_KEY, LEDGER_KEYS},
        events::{EventFeed, LedgerEvent},
        prompter::Prompter,
    },
    domain::{Entry, EntryKind, LedgerState, Money},
    errors::{LedgerError, ValidationError},
    storage::KeyValueStore,
};

pub const CLEAR_ALL_PROMPT: &str = "Are you sure you want to clear everything?";

/// What a confirmed [`LedgerStore::clear_all`] erases from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    /// Every key in the store, including ones the ledger does not own.
    #[default]
    Store,
    /// Only `despesas`, `receitas` and `saldo`.
    LedgerKeys,
}

impl fmt::Display for ClearScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClearScope::Store => "store",
            ClearScope::LedgerKeys => "ledger_keys",
        })
    }
}

impl FromStr for ClearScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "store" | "all" => Ok(ClearScope::Store),
            "ledger_keys" | "ledger" => Ok(ClearScope::LedgerKeys),
            other => Err(format!(
                "unknown clear scope `{other}` (expected store or ledger_keys)"
            )),
        }
    }
}

/// Owns the ledger state and keeps it, the balance and the persisted copy in step.
///
/// A store starts uninitialized; [`LedgerStore::load`] reads persisted data and
/// every other operation fails with [`LedgerError::NotLoaded`] until then.
pub struct LedgerStore {
    storage: Box<dyn KeyValueStore>,
    prompter: Box<dyn Prompter>,
    state: Option<LedgerState>,
    opening_balance: Money,
    clear_scope: ClearScope,
    events: EventFeed,
}

impl LedgerStore {
    pub fn new(storage: Box<dyn KeyValueStore>, prompter: Box<dyn Prompter>) -> Self {
        Self {
            storage,
            prompter,
            state: None,
            opening_balance: Money::ZERO,
            clear_scope: ClearScope::default(),
            events: EventFeed::default(),
        }
    }

    /// Builds a store and loads it in one step.
    pub fn open(
        storage: Box<dyn KeyValueStore>,
        prompter: Box<dyn Prompter>,
    ) -> Result<(Self, LoadReport), LedgerError> {
        let mut store = Self::new(storage, prompter);
        let report = store.load()?;
        Ok((store, report))
    }

    pub fn with_clear_scope(mut self, scope: ClearScope) -> Self {
        self.clear_scope = scope;
        self
    }

    pub fn clear_scope(&self) -> ClearScope {
        self.clear_scope
    }

    pub fn set_clear_scope(&mut self, scope: ClearScope) {
        self.clear_scope = scope;
    }

    /// Reads the three persisted keys and replaces the in-memory state.
    pub fn load(&mut self) -> Result<LoadReport, LedgerError> {
        let expenses = self.storage.get(EXPENSES_KEY)?;
        let incomes = self.storage.get(INCOMES_KEY)?;
        let balance = self.storage.get(BALANCE_KEY)?;
        let report = codec::decode_state(expenses.as_deref(), incomes.as_deref(), balance.as_deref());

        info!(
            expenses = report.state.expenses.len(),
            incomes = report.state.incomes.len(),
            balance = %report.state.balance,
            warnings = report.warnings.len(),
            "ledger loaded"
        );

        self.opening_balance = report.opening_balance;
        self.state = Some(report.state.clone());
        self.events.publish(LedgerEvent::Loaded {
            expenses: report.state.expenses.len(),
            incomes: report.state.incomes.len(),
            balance: report.state.balance,
        });
        Ok(report)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Result<&LedgerState, LedgerError> {
        self.state.as_ref().ok_or(LedgerError::NotLoaded)
    }

    pub fn snapshot(&self) -> Result<LedgerState, LedgerError> {
        self.state().cloned()
    }

    pub fn balance(&self) -> Result<Money, LedgerError> {
        Ok(self.state()?.balance)
    }

    /// Balance the ledger started from before any loaded entry was applied.
    pub fn opening_balance(&self) -> Money {
        self.opening_balance
    }

    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Appends an entry and moves the balance by its signed amount.
    ///
    /// An entry that would push a total or the balance past
    /// [`crate::domain::MAX_CENTS`] is rejected as
    /// [`ValidationError::InvalidAmount`]. Validation failures are reported
    /// through [`Prompter::notify`] before being returned; the state is left
    /// untouched.
    pub fn add_entry(
        &mut self,
        kind: EntryKind,
        description: &str,
        amount: f64,
    ) -> Result<(), LedgerError> {
        let mut next = self.snapshot()?;
        let entry = match Entry::new(description, amount) {
            Ok(entry) => entry,
            Err(err) => return Err(self.reject(err)),
        };

        next.entries_mut(kind).push(entry.clone());
        next.balance = match next.balance.checked_add(kind.signed(entry.amount())) {
            Some(balance) if next.is_within_range() => balance,
            _ => return Err(self.reject(ValidationError::InvalidAmount)),
        };
        let index = next.entries(kind).len() - 1;

        self.commit(next)?;
        let balance = self.balance()?;
        debug!(%kind, index, amount = %entry.amount(), %balance, "entry added");
        self.events.publish(LedgerEvent::EntryAdded {
            kind,
            index,
            entry,
            balance,
        });
        Ok(())
    }

    /// Removes the entry at `index` and reverses its effect on the balance.
    pub fn remove_entry(&mut self, kind: EntryKind, index: usize) -> Result<Entry, LedgerError> {
        let mut next = self.snapshot()?;
        let len = next.entries(kind).len();
        if index >= len {
            return Err(self.reject(ValidationError::IndexOutOfRange { kind, index, len }));
        }

        let entry = next.entries_mut(kind).remove(index);
        next.balance = match next.balance.checked_sub(kind.signed(entry.amount())) {
            Some(balance) => balance,
            None => return Err(self.reject(ValidationError::InvalidAmount)),
        };

        self.commit(next)?;
        let balance = self.balance()?;
        debug!(%kind, index, amount = %entry.amount(), %balance, "entry removed");
        self.events.publish(LedgerEvent::EntryRemoved {
            kind,
            index,
            entry: entry.clone(),
            balance,
        });
        Ok(entry)
    }

    /// Asks for confirmation, then empties the ledger and erases storage.
    ///
    /// Returns `Ok(false)` when the user declines; nothing changes in that case.
    pub fn clear_all(&mut self) -> Result<bool, LedgerError> {
        if !self.is_loaded() {
            return Err(LedgerError::NotLoaded);
        }
        if !self.prompter.confirm(CLEAR_ALL_PROMPT) {
            debug!("clear declined");
            return Ok(false);
        }

        match self.clear_scope {
            ClearScope::Store => self.storage.clear()?,
            ClearScope::LedgerKeys => {
                for key in LEDGER_KEYS {
                    self.storage.remove(key)?;
                }
            }
        }

        self.state = Some(LedgerState::default());
        self.opening_balance = Money::ZERO;
        info!(scope = %self.clear_scope, "ledger cleared");
        self.events.publish(LedgerEvent::Cleared);
        Ok(true)
    }

    /// Persists `next` and only then makes it the current state.
    fn commit(&mut self, next: LedgerState) -> Result<(), LedgerError> {
        let encoded = codec::encode_state(&next)?;
        self.storage.set_many(&encoded)?;
        self.state = Some(next);
        Ok(())
    }

    fn reject(&mut self, err: ValidationError) -> LedgerError {
        debug!(error = %err, "rejected ledger input");
        self.prompter.notify(&err.to_string());
        LedgerError::Validation(err)
    }
}
