//! Response views.
//!
//! Front-end screens read `kode` and `uraian`. Views keep every canonical
//! field and add those two aliases.

use blud_core::account::AccountType;
use blud_core::fiscal::Period;
use blud_core::general_ledger::LedgerBalance;
use blud_core::journal::{JournalEntry, JournalLine, JournalWithLines, ReversalOutcome};
use blud_core::trial_balance::{
    GroupedTrialBalance, TrialBalanceGroup, TrialBalanceReport, TrialBalanceRow,
    TrialBalanceSummary,
};
use serde::Serialize;

/// Journal header.
#[derive(Debug, Serialize)]
pub struct JournalView {
    /// Canonical fields.
    #[serde(flatten)]
    pub entry: JournalEntry,
    /// Journal number.
    pub kode: String,
    /// Description.
    pub uraian: String,
}

impl From<JournalEntry> for JournalView {
    fn from(entry: JournalEntry) -> Self {
        Self {
            kode: entry.journal_number.clone(),
            uraian: entry.description.clone(),
            entry,
        }
    }
}

/// Journal line.
#[derive(Debug, Serialize)]
pub struct JournalLineView {
    /// Canonical fields.
    #[serde(flatten)]
    pub line: JournalLine,
    /// Account code.
    pub kode: String,
    /// Line description, empty when the line has none.
    pub uraian: String,
}

impl From<JournalLine> for JournalLineView {
    fn from(line: JournalLine) -> Self {
        Self {
            kode: line.account_code.clone(),
            uraian: line.description.clone().unwrap_or_default(),
            line,
        }
    }
}

/// Journal with its lines.
#[derive(Debug, Serialize)]
pub struct JournalDetailView {
    /// Header.
    #[serde(flatten)]
    pub journal: JournalView,
    /// Lines in order.
    pub items: Vec<JournalLineView>,
}

impl From<JournalWithLines> for JournalDetailView {
    fn from(value: JournalWithLines) -> Self {
        Self {
            journal: value.entry.into(),
            items: value.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Both sides of a reversal.
#[derive(Debug, Serialize)]
pub struct ReversalView {
    /// The cancelled original.
    pub original: JournalView,
    /// The posted mirror entry.
    pub reversal: JournalView,
}

impl From<ReversalOutcome> for ReversalView {
    fn from(outcome: ReversalOutcome) -> Self {
        Self {
            original: outcome.original.into(),
            reversal: outcome.reversal.into(),
        }
    }
}

/// General ledger balance row.
#[derive(Debug, Serialize)]
pub struct LedgerBalanceView {
    /// Canonical fields.
    #[serde(flatten)]
    pub balance: LedgerBalance,
    /// Account code.
    pub kode: String,
    /// Account name.
    pub uraian: String,
}

impl From<LedgerBalance> for LedgerBalanceView {
    fn from(balance: LedgerBalance) -> Self {
        Self {
            kode: balance.account_code.clone(),
            uraian: balance.account_name.clone(),
            balance,
        }
    }
}

/// Trial balance row.
#[derive(Debug, Serialize)]
pub struct TrialBalanceRowView {
    /// Canonical fields.
    #[serde(flatten)]
    pub row: TrialBalanceRow,
    /// Account code.
    pub kode: String,
    /// Account name.
    pub uraian: String,
}

impl From<TrialBalanceRow> for TrialBalanceRowView {
    fn from(row: TrialBalanceRow) -> Self {
        Self {
            kode: row.account_code.clone(),
            uraian: row.account_name.clone(),
            row,
        }
    }
}

fn rows(rows: Vec<TrialBalanceRow>) -> Vec<TrialBalanceRowView> {
    rows.into_iter().map(Into::into).collect()
}

/// Trial balance of a period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceView {
    /// Period.
    pub period: Period,
    /// Rows by account code.
    pub rows: Vec<TrialBalanceRowView>,
    /// Totals.
    pub summary: TrialBalanceSummary,
}

impl From<TrialBalanceReport> for TrialBalanceView {
    fn from(report: TrialBalanceReport) -> Self {
        Self {
            period: report.period,
            rows: rows(report.rows),
            summary: report.summary,
        }
    }
}

/// One classification of a grouped trial balance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceGroupView {
    /// Classification.
    pub account_type: AccountType,
    /// Display label.
    pub label: String,
    /// Rows by account code.
    pub rows: Vec<TrialBalanceRowView>,
    /// Group subtotal.
    pub subtotal: TrialBalanceSummary,
}

impl From<TrialBalanceGroup> for TrialBalanceGroupView {
    fn from(group: TrialBalanceGroup) -> Self {
        Self {
            account_type: group.account_type,
            label: group.label,
            rows: rows(group.rows),
            subtotal: group.subtotal,
        }
    }
}

/// Trial balance grouped by classification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedTrialBalanceView {
    /// Period.
    pub period: Period,
    /// Groups in reporting order.
    pub groups: Vec<TrialBalanceGroupView>,
    /// Grand totals.
    pub summary: TrialBalanceSummary,
}

impl From<GroupedTrialBalance> for GroupedTrialBalanceView {
    fn from(grouped: GroupedTrialBalance) -> Self {
        Self {
            period: grouped.period,
            groups: grouped.groups.into_iter().map(Into::into).collect(),
            summary: grouped.summary,
        }
    }
}
