//! Normal-balance arithmetic.
//!
//! - Debit-normal accounts: balance += debit - credit
//! - Credit-normal accounts: balance += credit - debit

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalBalance {
    /// Balance grows with debits (assets, expenses).
    Debit,
    /// Balance grows with credits (liabilities, equity, revenue).
    Credit,
}

impl NormalBalance {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Parses a normal balance from a string, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEBIT" | "D" => Some(Self::Debit),
            "CREDIT" | "K" | "C" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Calculates the balance change for a debit/credit movement.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Closing balance from an opening balance and the period totals.
    #[must_use]
    pub fn closing_balance(self, opening: Decimal, debit: Decimal, credit: Decimal) -> Decimal {
        opening + self.balance_change(debit, credit)
    }

    /// Maps a balance back into `(debit, credit)` columns.
    ///
    /// A positive balance lands on the normal side. A negative (contra)
    /// balance lands on the opposite side as its absolute value.
    #[must_use]
    pub fn to_columns(self, balance: Decimal) -> (Decimal, Decimal) {
        let on_normal_side = balance >= Decimal::ZERO;
        match (self, on_normal_side) {
            (Self::Debit, true) | (Self::Credit, false) => (balance.abs(), Decimal::ZERO),
            (Self::Debit, false) | (Self::Credit, true) => (Decimal::ZERO, balance.abs()),
        }
    }

    /// The balance expressed as `debit - credit`.
    #[must_use]
    pub fn signed_debit(self, balance: Decimal) -> Decimal {
        match self {
            Self::Debit => balance,
            Self::Credit => -balance,
        }
    }
}

impl std::fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
