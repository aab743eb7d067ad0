use crate::domain::{Entry, EntryKind, Money};

/// Snapshot of the ledger: both entry sequences plus the running balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub expenses: Vec<Entry>,
    pub incomes: Vec<Entry>,
    pub balance: Money,
}

impl LedgerState {
    pub fn entries(&self, kind: EntryKind) -> &[Entry] {
        match kind {
            EntryKind::Income => &self.incomes,
            EntryKind::Expense => &self.expenses,
        }
    }

    pub(crate) fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<Entry> {
        match kind {
            EntryKind::Income => &mut self.incomes,
            EntryKind::Expense => &mut self.expenses,
        }
    }

    pub fn total(&self, kind: EntryKind) -> Money {
        self.entries(kind).iter().map(Entry::amount).sum()
    }

    /// Income total minus expense total, ignoring any opening offset.
    pub fn net(&self) -> Money {
        self.total(EntryKind::Income) - self.total(EntryKind::Expense)
    }

    /// Like [`LedgerState::total`], but `None` once the sum leaves the money range.
    pub fn checked_total(&self, kind: EntryKind) -> Option<Money> {
        Money::checked_sum(self.entries(kind).iter().map(Entry::amount))
    }

    pub fn checked_net(&self) -> Option<Money> {
        self.checked_total(EntryKind::Income)?
            .checked_sub(self.checked_total(EntryKind::Expense)?)
    }

    /// True when both totals and the balance are representable, which is what
    /// lets a persisted state load back unchanged.
    pub fn is_within_range(&self) -> bool {
        self.balance.is_in_range() && self.checked_net().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.incomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_CENTS;

    fn entry(description: &str, amount: f64) -> Entry {
        Entry::new(description, amount).expect("valid entry")
    }

    #[test]
    fn totals_follow_entry_sequences() {
        let state = LedgerState {
            expenses: vec![entry("Rent", 500.0), entry("Food", 120.5)],
            incomes: vec![entry("Salary", 1_000.0)],
            balance: Money::from_cents(37_950),
        };

        assert_eq!(state.total(EntryKind::Expense), Money::from_cents(62_050));
        assert_eq!(state.total(EntryKind::Income), Money::from_cents(100_000));
        assert_eq!(state.net(), state.balance);
        assert!(!state.is_empty());
    }

    #[test]
    fn totals_past_the_money_range_are_detected() {
        let huge = Entry::from_parts("Huge", Money::from_cents(MAX_CENTS)).expect("valid entry");
        let state = LedgerState {
            expenses: Vec::new(),
            incomes: vec![huge.clone(), huge],
            balance: Money::ZERO,
        };

        assert_eq!(state.checked_total(EntryKind::Income), None);
        assert_eq!(state.checked_net(), None);
        assert!(!state.is_within_range());
        assert!(LedgerState::default().is_within_range());
    }
}
