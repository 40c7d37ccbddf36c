//! Journal domain types.

use std::fmt;

use blud_shared::types::{AccountId, JournalId, JournalLineId, within_tolerance};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fiscal::Period;

/// Journal lifecycle status.
///
/// Valid transitions:
/// - Draft → Posted (post, or approve of a draft)
/// - Posted → Cancelled (reverse)
/// - Draft → deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalStatus {
    /// Editable.
    Draft,
    /// Posted to the ledger (immutable).
    Posted,
    /// Reversed (immutable, terminal).
    Cancelled,
}

impl JournalStatus {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "POSTED" => Some(Self::Posted),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the journal can be modified or deleted.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Manually entered journal (jurnal umum).
    General,
    /// Produced by auto-posting.
    Auto,
    /// Mirror entry created by a reversal.
    Reversal,
    /// Period-end adjustment (jurnal penyesuaian).
    Adjustment,
    /// Opening balance entry (saldo awal).
    Opening,
    /// Period closing entry (jurnal penutup).
    Closing,
}

impl EntryType {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Auto => "AUTO",
            Self::Reversal => "REVERSAL",
            Self::Adjustment => "ADJUSTMENT",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
        }
    }

    /// Parses an entry type, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GENERAL" => Some(Self::General),
            "AUTO" => Some(Self::Auto),
            "REVERSAL" => Some(Self::Reversal),
            "ADJUSTMENT" => Some(Self::Adjustment),
            "OPENING" => Some(Self::Opening),
            "CLOSING" => Some(Self::Closing),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journal number of the form `JU/YYYY/MM/NNNN`.
pub struct JournalNumber;

impl JournalNumber {
    /// Prefix shared by every number.
    pub const PREFIX: &'static str = "JU";

    /// Formats the number for `sequence` within `period`.
    #[must_use]
    pub fn format(period: Period, sequence: u32) -> String {
        format!(
            "{}/{:04}/{:02}/{sequence:04}",
            Self::PREFIX,
            period.year(),
            period.month()
        )
    }

    /// Splits a number back into period and sequence.
    #[must_use]
    pub fn parse(number: &str) -> Option<(Period, u32)> {
        let mut parts = number.split('/');
        if parts.next()? != Self::PREFIX {
            return None;
        }
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;
        let sequence: u32 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((Period::new(year, month).ok()?, sequence))
    }
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Totals agree within 0.01.
    pub is_balanced: bool,
}

impl JournalTotals {
    /// Builds totals and derives the balance flag.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: within_tolerance(total_debit, total_credit),
        }
    }

    /// Totals over `(debit, credit)` pairs.
    pub fn from_amounts(amounts: impl IntoIterator<Item = (Decimal, Decimal)>) -> Self {
        let (debit, credit) = amounts
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), (ld, lc)| (d + ld, c + lc));
        Self::new(debit, credit)
    }
}

/// Journal header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalId,
    /// Unique `JU/YYYY/MM/NNNN` number.
    pub journal_number: String,
    /// Transaction date.
    pub entry_date: NaiveDate,
    /// Accounting period.
    pub period: Period,
    /// Fiscal year.
    pub year: i32,
    /// Classification.
    pub entry_type: EntryType,
    /// Originating transaction kind.
    pub source_type: Option<String>,
    /// Originating transaction id.
    pub source_id: Option<String>,
    /// Narrative.
    pub description: String,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Totals agree within 0.01.
    pub is_balanced: bool,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// Has been posted (stays true after cancellation).
    pub is_posted: bool,
    /// Has been approved.
    pub is_approved: bool,
    /// Has been reversed.
    pub is_reversed: bool,
    /// Mirror entry that reversed this journal.
    pub reversal_journal_id: Option<JournalId>,
    /// For a reversal entry, the journal it cancels.
    pub reversal_of: Option<JournalId>,
    /// Reason given when reversing.
    pub reversal_reason: Option<String>,
    /// Creating actor.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Posting actor.
    pub posted_by: Option<String>,
    /// Posting time.
    pub posted_at: Option<DateTime<Utc>>,
    /// Approving actor.
    pub approved_by: Option<String>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reversing actor.
    pub reversed_by: Option<String>,
    /// Reversal time.
    pub reversed_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Returns the totals stored on the header.
    #[must_use]
    pub fn totals(&self) -> JournalTotals {
        JournalTotals {
            total_debit: self.total_debit,
            total_credit: self.total_credit,
            is_balanced: self.is_balanced,
        }
    }
}

/// Journal detail line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Owning journal.
    pub journal_id: JournalId,
    /// 1-based position.
    pub line_number: i32,
    /// Posted account.
    pub account_id: AccountId,
    /// Account code at creation time.
    pub account_code: String,
    /// Account name at creation time.
    pub account_name: String,
    /// Optional cost center reference.
    pub cost_center: Option<String>,
    /// Line narrative.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Journal header with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalWithLines {
    /// Header.
    #[serde(flatten)]
    pub entry: JournalEntry,
    /// Lines ordered by line number.
    pub items: Vec<JournalLine>,
}

/// Line as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineInput {
    /// Account code to post to.
    pub account_code: String,
    /// Line narrative.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional cost center reference.
    #[serde(default)]
    pub cost_center: Option<String>,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
}

impl JournalLineInput {
    /// Debit line.
    #[must_use]
    pub fn debit(account_code: &str, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            description: None,
            cost_center: None,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// Credit line.
    #[must_use]
    pub fn credit(account_code: &str, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            description: None,
            cost_center: None,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// Returns the line with a description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for creating a journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJournalInput {
    /// Transaction date.
    pub entry_date: NaiveDate,
    /// Period override; derived from `entry_date` when absent.
    pub period: Option<Period>,
    /// Classification.
    pub entry_type: EntryType,
    /// Originating transaction kind.
    pub source_type: Option<String>,
    /// Originating transaction id.
    pub source_id: Option<String>,
    /// Narrative.
    pub description: String,
    /// At least two lines.
    pub lines: Vec<JournalLineInput>,
    /// Creating actor.
    pub created_by: String,
}

/// Changes to a draft journal. Absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateJournalInput {
    /// New transaction date.
    pub entry_date: Option<NaiveDate>,
    /// New period override.
    pub period: Option<Period>,
    /// New narrative.
    pub description: Option<String>,
    /// Replacement lines; revalidated like on create.
    pub lines: Option<Vec<JournalLineInput>>,
}

/// Line ready for storage, with the account resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalLine {
    /// 1-based position.
    pub line_number: i32,
    /// Posted account.
    pub account_id: AccountId,
    /// Account code snapshot.
    pub account_code: String,
    /// Account name snapshot.
    pub account_name: String,
    /// Cost center reference.
    pub cost_center: Option<String>,
    /// Line narrative.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Validated journal ready for storage. The store assigns id and number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDraft {
    /// Transaction date.
    pub entry_date: NaiveDate,
    /// Accounting period.
    pub period: Period,
    /// Classification.
    pub entry_type: EntryType,
    /// Originating transaction kind.
    pub source_type: Option<String>,
    /// Originating transaction id.
    pub source_id: Option<String>,
    /// Narrative.
    pub description: String,
    /// Line totals.
    pub totals: JournalTotals,
    /// For a reversal entry, the journal it cancels.
    pub reversal_of: Option<JournalId>,
    /// Creating actor.
    pub created_by: String,
    /// Resolved lines.
    pub lines: Vec<NewJournalLine>,
}

impl JournalDraft {
    /// Materializes the draft as a stored entry.
    ///
    /// Used by storage backends once an id and number are allocated.
    #[must_use]
    pub fn into_entry(
        self,
        id: JournalId,
        journal_number: String,
        now: DateTime<Utc>,
    ) -> (JournalEntry, Vec<JournalLine>) {
        let lines = self
            .lines
            .into_iter()
            .map(|l| JournalLine {
                id: JournalLineId::new(),
                journal_id: id,
                line_number: l.line_number,
                account_id: l.account_id,
                account_code: l.account_code,
                account_name: l.account_name,
                cost_center: l.cost_center,
                description: l.description,
                debit: l.debit,
                credit: l.credit,
            })
            .collect();

        let entry = JournalEntry {
            id,
            journal_number,
            entry_date: self.entry_date,
            period: self.period,
            year: self.period.year(),
            entry_type: self.entry_type,
            source_type: self.source_type,
            source_id: self.source_id,
            description: self.description,
            total_debit: self.totals.total_debit,
            total_credit: self.totals.total_credit,
            is_balanced: self.totals.is_balanced,
            status: JournalStatus::Draft,
            is_posted: false,
            is_approved: false,
            is_reversed: false,
            reversal_journal_id: None,
            reversal_of: self.reversal_of,
            reversal_reason: None,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
            posted_by: None,
            posted_at: None,
            approved_by: None,
            approved_at: None,
            reversed_by: None,
            reversed_at: None,
        };
        (entry, lines)
    }
}

/// Status change applied through a compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalTransition {
    /// Draft → Posted.
    Post {
        /// Posting actor.
        actor: String,
        /// Posting time.
        at: DateTime<Utc>,
    },
    /// Mark approved; when `post` is set the draft is posted as well.
    Approve {
        /// Approving actor.
        actor: String,
        /// Approval time.
        at: DateTime<Utc>,
        /// Also perform Draft → Posted.
        post: bool,
    },
}

impl JournalTransition {
    /// Applies the change to an entry whose status already matched.
    pub fn apply(&self, entry: &mut JournalEntry) {
        match self {
            Self::Post { actor, at } => {
                entry.status = JournalStatus::Posted;
                entry.is_posted = true;
                entry.posted_by = Some(actor.clone());
                entry.posted_at = Some(*at);
                entry.updated_at = *at;
            }
            Self::Approve { actor, at, post } => {
                entry.is_approved = true;
                entry.approved_by = Some(actor.clone());
                entry.approved_at = Some(*at);
                entry.updated_at = *at;
                if *post {
                    entry.status = JournalStatus::Posted;
                    entry.is_posted = true;
                    entry.posted_by = Some(actor.clone());
                    entry.posted_at = Some(*at);
                }
            }
        }
    }

    /// Extra guard besides the status match.
    #[must_use]
    pub fn precondition_holds(&self, entry: &JournalEntry) -> bool {
        match self {
            Self::Post { .. } => true,
            Self::Approve { .. } => !entry.is_approved,
        }
    }
}

/// Audit data for a reversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalStamp {
    /// Reversing actor.
    pub actor: String,
    /// Reason.
    pub reason: String,
    /// Reversal time.
    pub at: DateTime<Utc>,
}

impl ReversalStamp {
    /// Marks `original` as reversed by `reversal_id`.
    pub fn apply_to_original(&self, original: &mut JournalEntry, reversal_id: JournalId) {
        original.status = JournalStatus::Cancelled;
        original.is_reversed = true;
        original.reversal_journal_id = Some(reversal_id);
        original.reversal_reason = Some(self.reason.clone());
        original.reversed_by = Some(self.actor.clone());
        original.reversed_at = Some(self.at);
        original.updated_at = self.at;
    }

    /// Marks the freshly inserted mirror entry as posted.
    pub fn apply_to_mirror(&self, mirror: &mut JournalEntry) {
        mirror.status = JournalStatus::Posted;
        mirror.is_posted = true;
        mirror.posted_by = Some(self.actor.clone());
        mirror.posted_at = Some(self.at);
        mirror.reversal_reason = Some(self.reason.clone());
    }
}

/// Journal list filter. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalFilter {
    /// Substring of the journal number.
    pub journal_number: Option<String>,
    /// Earliest entry date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Exact period.
    pub period: Option<Period>,
    /// Exact year.
    pub year: Option<i32>,
    /// Exact entry type.
    pub entry_type: Option<EntryType>,
    /// Exact source type.
    pub source_type: Option<String>,
    /// Exact source id.
    pub source_id: Option<String>,
    /// Exact status.
    pub status: Option<JournalStatus>,
    /// Exact creating actor.
    pub created_by: Option<String>,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
}

impl JournalFilter {
    /// Returns true if `entry` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        let contains_ci = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        self.journal_number
            .as_deref()
            .is_none_or(|n| contains_ci(&entry.journal_number, n))
            && self.date_from.is_none_or(|d| entry.entry_date >= d)
            && self.date_to.is_none_or(|d| entry.entry_date <= d)
            && self.period.is_none_or(|p| entry.period == p)
            && self.year.is_none_or(|y| entry.year == y)
            && self.entry_type.is_none_or(|t| entry.entry_type == t)
            && self
                .source_type
                .as_deref()
                .is_none_or(|s| entry.source_type.as_deref() == Some(s))
            && self
                .source_id
                .as_deref()
                .is_none_or(|s| entry.source_id.as_deref() == Some(s))
            && self.status.is_none_or(|s| entry.status == s)
            && self
                .created_by
                .as_deref()
                .is_none_or(|c| entry.created_by == c)
            && self
                .description
                .as_deref()
                .is_none_or(|d| contains_ci(&entry.description, d))
    }
}

/// A posted line with its journal context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedLine {
    /// Journal id.
    pub journal_id: JournalId,
    /// Journal number.
    pub journal_number: String,
    /// Journal entry date.
    pub entry_date: NaiveDate,
    /// Journal period.
    pub period: Period,
    /// Journal description.
    pub journal_description: String,
    /// The line.
    pub line: JournalLine,
}
