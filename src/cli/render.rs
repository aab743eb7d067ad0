//! Plain-text views of the ledger used by the shell.

use crate::domain::{Entry, EntryKind, LedgerState, Money};

/// `R$ 12.50`, `R$ -3.00`.
pub fn format_amount(symbol: &str, amount: Money) -> String {
    format!("{symbol} {amount}")
}

pub fn kind_title(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "Incomes",
        EntryKind::Expense => "Expenses",
    }
}

fn empty_placeholder(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "No incomes",
        EntryKind::Expense => "No expenses",
    }
}

/// One numbered line per entry (1-based, as accepted by `remove`).
pub fn entry_lines(kind: EntryKind, entries: &[Entry], symbol: &str) -> Vec<String> {
    if entries.is_empty() {
        return vec![empty_placeholder(kind).to_string()];
    }
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            format!(
                "{:>3}. {} - {}",
                idx + 1,
                entry.description(),
                format_amount(symbol, entry.amount())
            )
        })
        .collect()
}

pub fn balance_line(state: &LedgerState, symbol: &str) -> String {
    format!("Balance: {}", format_amount(symbol, state.balance))
}

pub fn totals_line(state: &LedgerState, symbol: &str) -> String {
    format!(
        "Incomes: {} | Expenses: {}",
        format_amount(symbol, state.total(EntryKind::Income)),
        format_amount(symbol, state.total(EntryKind::Expense))
    )
}

/// Whole-ledger view: both lists, totals, balance.
pub fn render_ledger(state: &LedgerState, symbol: &str) -> String {
    let mut lines = Vec::new();
    for kind in [EntryKind::Expense, EntryKind::Income] {
        lines.push(format!("{}:", kind_title(kind)));
        lines.extend(entry_lines(kind, state.entries(kind), symbol));
    }
    lines.push(totals_line(state, symbol));
    lines.push(balance_line(state, symbol));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_keep_sign_after_symbol() {
        assert_eq!(format_amount("R$", Money::from_cents(-300)), "R$ -3.00");
    }

    #[test]
    fn empty_lists_show_placeholder() {
        assert_eq!(
            entry_lines(EntryKind::Income, &[], "R$"),
            vec!["No incomes".to_string()]
        );
    }
}
