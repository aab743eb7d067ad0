use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{domain::Money, errors::ValidationError};

/// Which side of the ledger an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    /// Effect of an entry of this kind on the balance.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            EntryKind::Income => amount,
            EntryKind::Expense => -amount,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntryKind(pub String);

impl fmt::Display for UnknownEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entry kind `{}` (expected income or expense)", self.0)
    }
}

impl std::error::Error for UnknownEntryKind {}

impl FromStr for EntryKind {
    type Err = UnknownEntryKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "receita" => Ok(EntryKind::Income),
            "expense" | "despesa" => Ok(EntryKind::Expense),
            _ => Err(UnknownEntryKind(value.to_string())),
        }
    }
}

/// One recorded income or expense line.
///
/// Construction goes through [`Entry::new`], so a live entry always has a
/// non-blank description and a strictly positive amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    description: String,
    amount: Money,
}

impl Entry {
    /// Validates raw user input. The description is kept exactly as typed;
    /// only its trimmed form has to be non-empty.
    pub fn new(description: &str, amount: f64) -> Result<Self, ValidationError> {
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let amount = Money::from_decimal(amount).ok_or(ValidationError::InvalidAmount)?;
        Self::from_parts(description, amount)
    }

    pub fn from_parts(description: impl Into<String>, amount: Money) -> Result<Self, ValidationError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if !amount.is_positive() {
            return Err(ValidationError::InvalidAmount);
        }
        Ok(Self {
            description,
            amount,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_description_as_typed() {
        let entry = Entry::new("  Rent  ", 500.0).expect("valid entry");
        assert_eq!(entry.description(), "  Rent  ");
        assert_eq!(entry.amount(), Money::from_cents(50_000));
    }

    #[test]
    fn new_rejects_blank_description() {
        assert_eq!(
            Entry::new(" \t ", 10.0),
            Err(ValidationError::EmptyDescription)
        );
    }

    #[test]
    fn new_rejects_invalid_amounts() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, 0.004] {
            assert_eq!(
                Entry::new("Salary", amount),
                Err(ValidationError::InvalidAmount),
                "amount {amount} should be rejected"
            );
        }
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("Income".parse::<EntryKind>(), Ok(EntryKind::Income));
        assert_eq!("despesa".parse::<EntryKind>(), Ok(EntryKind::Expense));
        assert!("transfer".parse::<EntryKind>().is_err());
    }

    #[test]
    fn kind_signs_amounts() {
        let amount = Money::from_cents(250);
        assert_eq!(EntryKind::Income.signed(amount), amount);
        assert_eq!(EntryKind::Expense.signed(amount), -amount);
    }
}
