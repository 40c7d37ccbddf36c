//! Chart of accounts types.

use std::fmt;

use blud_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::balance::NormalBalance;
use super::error::AccountError;

/// Maximum depth of a dot-segmented account code.
pub const MAX_CODE_LEVEL: usize = 6;

/// Account classification, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Aset.
    Asset,
    /// Kewajiban.
    Liability,
    /// Ekuitas.
    Equity,
    /// Pendapatan.
    Revenue,
    /// Beban / belanja.
    Expense,
    /// Pembiayaan.
    Financing,
}

impl AccountType {
    /// All types in reporting order.
    pub const ALL: [Self; 6] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
        Self::Financing,
    ];

    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
            Self::Financing => "FINANCING",
        }
    }

    /// Indonesian group label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asset => "Aset",
            Self::Liability => "Kewajiban",
            Self::Equity => "Ekuitas",
            Self::Revenue => "Pendapatan",
            Self::Expense => "Beban",
            Self::Financing => "Pembiayaan",
        }
    }

    /// Parses an account type, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASSET" => Some(Self::Asset),
            "LIABILITY" => Some(Self::Liability),
            "EQUITY" => Some(Self::Equity),
            "REVENUE" => Some(Self::Revenue),
            "EXPENSE" => Some(Self::Expense),
            "FINANCING" => Some(Self::Financing),
            _ => None,
        }
    }

    /// Conventional normal balance for the type.
    ///
    /// Financing accounts carry their own stored normal balance; `Credit`
    /// is only the default for new ones.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue | Self::Financing => {
                NormalBalance::Credit
            }
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, dot-segmented account code such as `4.1.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountCode(String);

impl AccountCode {
    /// Parses and validates a code.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCode` for empty segments, characters other
    /// than ASCII alphanumerics, or more than [`MAX_CODE_LEVEL`] segments.
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let code = raw.trim();
        let segments: Vec<&str> = code.split('.').collect();
        let valid = !code.is_empty()
            && segments.len() <= MAX_CODE_LEVEL
            && segments
                .iter()
                .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(AccountError::InvalidCode(raw.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// Number of segments.
    #[must_use]
    pub fn level(&self) -> u8 {
        u8::try_from(self.0.split('.').count()).unwrap_or(u8::MAX)
    }

    /// Code of the parent account, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(parent, _)| Self(parent.to_string()))
    }

    /// Borrows the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chart of accounts entry.
///
/// Maintained by master-data administration; read-only to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique hierarchical code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Depth in the hierarchy (1 for top level).
    pub level: u8,
    /// Code of the parent account.
    pub parent_code: Option<String>,
    /// Side on which the balance grows.
    pub normal_balance: NormalBalance,
    /// Inactive accounts cannot receive postings.
    pub is_active: bool,
    /// Header accounts group children and cannot receive postings.
    pub is_header: bool,
}

impl Account {
    /// Builds an active account, deriving level, parent and normal balance from
    /// the code and type.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid.
    pub fn new(
        code: &str,
        name: impl Into<String>,
        account_type: AccountType,
        is_header: bool,
    ) -> Result<Self, AccountError> {
        let parsed = AccountCode::parse(code)?;
        Ok(Self {
            id: AccountId::new(),
            level: parsed.level(),
            parent_code: parsed.parent().map(|p| p.to_string()),
            code: parsed.to_string(),
            name: name.into(),
            account_type,
            normal_balance: account_type.default_normal_balance(),
            is_active: true,
            is_header,
        })
    }

    /// Returns the account with a different normal balance.
    #[must_use]
    pub fn with_normal_balance(mut self, normal_balance: NormalBalance) -> Self {
        self.normal_balance = normal_balance;
        self
    }

    /// Returns the account marked inactive.
    #[must_use]
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks the account may receive journal lines.
    ///
    /// # Errors
    ///
    /// Fails if the account is inactive or a header account.
    pub fn ensure_postable(&self) -> Result<(), AccountError> {
        if !self.is_active {
            return Err(AccountError::Inactive(self.code.clone()));
        }
        if self.is_header {
            return Err(AccountError::HeaderAccount(self.code.clone()));
        }
        Ok(())
    }
}
