use std::sync::mpsc::{self, Receiver, Sender};

use crate::domain::{Entry, EntryKind, Money};

/// Change notifications published after every successful state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Loaded {
        expenses: usize,
        incomes: usize,
        balance: Money,
    },
    EntryAdded {
        kind: EntryKind,
        index: usize,
        entry: Entry,
        balance: Money,
    },
    EntryRemoved {
        kind: EntryKind,
        index: usize,
        entry: Entry,
        balance: Money,
    },
    Cleared,
}

/// Fan-out of [`LedgerEvent`]s to channel subscribers.
///
/// Subscribers whose receiver has been dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventFeed {
    subscribers: Vec<Sender<LedgerEvent>>,
}

impl EventFeed {
    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: LedgerEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
