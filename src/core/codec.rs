//! Persisted representation of the ledger.
//!
//! Three independent keys, string-valued:
//! `despesas` and `receitas` hold JSON arrays of `{"descricao", "valor"}`
//! objects, `saldo` holds the balance as a plain decimal string.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{Entry, LedgerState, Money};

pub const EXPENSES_KEY: &str = "despesas";
pub const INCOMES_KEY: &str = "receitas";
pub const BALANCE_KEY: &str = "saldo";

/// Every key the ledger owns in the store.
pub const LEDGER_KEYS: [&str; 3] = [EXPENSES_KEY, INCOMES_KEY, BALANCE_KEY];

#[derive(Serialize)]
struct StoredEntryRef<'a> {
    descricao: &'a str,
    valor: Money,
}

#[derive(Deserialize)]
struct StoredEntry {
    descricao: String,
    valor: Money,
}

/// Result of decoding the persisted keys.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub state: LedgerState,
    /// Persisted balance minus the net of the loaded entries.
    pub opening_balance: Money,
    /// One line per field or entry that was dropped or defaulted.
    pub warnings: Vec<String>,
}

pub fn encode_entries(entries: &[Entry]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredEntryRef<'_>> = entries
        .iter()
        .map(|entry| StoredEntryRef {
            descricao: entry.description(),
            valor: entry.amount(),
        })
        .collect();
    serde_json::to_string(&stored)
}

pub fn encode_balance(balance: Money) -> String {
    balance.to_plain_string()
}

/// Serialises the full state into `(key, value)` pairs ready for a batch write.
pub fn encode_state(state: &LedgerState) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    Ok(vec![
        (EXPENSES_KEY, encode_entries(&state.expenses)?),
        (INCOMES_KEY, encode_entries(&state.incomes)?),
        (BALANCE_KEY, encode_balance(state.balance)),
    ])
}

/// Decodes one entry list. Anything unusable degrades to fewer entries, never
/// to an error: a malformed field yields an empty list, a malformed element is
/// skipped.
pub fn decode_entries(key: &str, raw: Option<&str>, warnings: &mut Vec<String>) -> Vec<Entry> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => return Vec::new(),
        Ok(other) => {
            push_warning(warnings, format!("`{key}` is not a list ({}); ignored", json_kind(&other)));
            return Vec::new();
        }
        Err(err) => {
            push_warning(warnings, format!("`{key}` could not be parsed ({err}); ignored"));
            return Vec::new();
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let stored: StoredEntry = match serde_json::from_value(item) {
            Ok(stored) => stored,
            Err(err) => {
                push_warning(warnings, format!("`{key}` item {position} is malformed ({err}); dropped"));
                continue;
            }
        };
        match Entry::from_parts(stored.descricao, stored.valor) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                push_warning(warnings, format!("`{key}` item {position} is invalid ({err}); dropped"));
            }
        }
    }
    entries
}

/// Decodes the persisted balance, defaulting to zero when absent or not a
/// finite number.
pub fn decode_balance(raw: Option<&str>, warnings: &mut Vec<String>) -> Money {
    let Some(raw) = raw else {
        return Money::ZERO;
    };
    match Money::parse_plain(raw) {
        Some(balance) => balance,
        None => {
            push_warning(warnings, format!("`{BALANCE_KEY}` value `{raw}` is not a number; using 0"));
            Money::ZERO
        }
    }
}

/// Builds a [`LoadReport`] from the raw values of the three keys.
pub fn decode_state(
    expenses: Option<&str>,
    incomes: Option<&str>,
    balance: Option<&str>,
) -> LoadReport {
    let mut warnings = Vec::new();
    let expenses = decode_entries(EXPENSES_KEY, expenses, &mut warnings);
    let incomes = decode_entries(INCOMES_KEY, incomes, &mut warnings);
    let balance = decode_balance(balance, &mut warnings);

    let state = LedgerState {
        expenses,
        incomes,
        balance,
    };
    let opening_balance = match state.checked_net().and_then(|net| state.balance.checked_sub(net)) {
        Some(offset) => offset,
        None => {
            push_warning(
                &mut warnings,
                "entry totals are out of range; opening balance not derived".to_string(),
            );
            Money::ZERO
        }
    };
    if opening_balance != Money::ZERO {
        push_warning(
            &mut warnings,
            format!("persisted balance differs from the entries by {opening_balance}; kept as opening balance"),
        );
    }
    LoadReport {
        state,
        opening_balance,
        warnings,
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(description: &str, amount: f64) -> Entry {
        Entry::new(description, amount).expect("valid entry")
    }

    #[test]
    fn entries_encode_with_persisted_field_names() {
        let json = encode_entries(&[entry("Rent", 500.0), entry("Coffee", 4.5)]).unwrap();
        assert_eq!(
            json,
            r#"[{"descricao":"Rent","valor":500},{"descricao":"Coffee","valor":4.5}]"#
        );
    }

    #[test]
    fn decode_reads_what_encode_wrote() {
        let state = LedgerState {
            expenses: vec![entry("Rent", 500.0)],
            incomes: vec![entry("Salary", 1_250.75)],
            balance: Money::from_cents(75_075),
        };
        let encoded = encode_state(&state).unwrap();
        let report = decode_state(
            Some(&encoded[0].1),
            Some(&encoded[1].1),
            Some(&encoded[2].1),
        );
        assert_eq!(report.state, state);
        assert_eq!(report.opening_balance, Money::ZERO);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn malformed_field_does_not_affect_others() {
        let report = decode_state(
            Some("{broken"),
            Some(r#"[{"descricao":"Gift","valor":100}]"#),
            Some("100"),
        );
        assert!(report.state.expenses.is_empty());
        assert_eq!(report.state.incomes.len(), 1);
        assert_eq!(report.state.balance, Money::from_cents(10_000));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn invalid_entries_are_dropped_with_warnings() {
        let raw = r#"[
            {"descricao":"Rent","valor":500},
            {"descricao":"   ","valor":10},
            {"descricao":"Refund","valor":-20},
            {"descricao":"Broken","valor":null},
            "not an object"
        ]"#;
        let mut warnings = Vec::new();
        let entries = decode_entries(EXPENSES_KEY, Some(raw), &mut warnings);
        assert_eq!(entries, vec![entry("Rent", 500.0)]);
        assert_eq!(warnings.len(), 4);
    }

    #[test]
    fn non_numeric_balance_defaults_to_zero() {
        let mut warnings = Vec::new();
        assert_eq!(decode_balance(Some("NaN"), &mut warnings), Money::ZERO);
        assert_eq!(decode_balance(None, &mut warnings), Money::ZERO);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn out_of_range_amounts_are_dropped() {
        let raw = r#"[{"descricao":"Fine","valor":12.5},{"descricao":"Absurd","valor":1e300}]"#;
        let mut warnings = Vec::new();
        let entries = decode_entries(INCOMES_KEY, Some(raw), &mut warnings);
        assert_eq!(entries, vec![entry("Fine", 12.5)]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn overflowing_totals_do_not_panic() {
        let item = r#"{"descricao":"Huge","valor":45035996273704.96}"#;
        let raw = format!("[{}]", vec![item; 4].join(","));
        let report = decode_state(None, Some(&raw), Some("0"));
        assert_eq!(report.state.incomes.len(), 4);
        assert_eq!(report.opening_balance, Money::ZERO);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn balance_offset_becomes_opening_balance() {
        let report = decode_state(None, None, Some("250"));
        assert_eq!(report.state.balance, Money::from_cents(25_000));
        assert_eq!(report.opening_balance, Money::from_cents(25_000));
        assert_eq!(report.warnings.len(), 1);
    }
}
