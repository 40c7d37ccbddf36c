//! Domain events and their topics.

use std::fmt;

use blud_shared::types::JournalId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fiscal::Period;

/// Named topic an event is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// A business module recorded a transaction.
    #[serde(rename = "transaction.created")]
    TransactionCreated,
    /// A business module changed a transaction.
    #[serde(rename = "transaction.updated")]
    TransactionUpdated,
    /// A business module removed a transaction.
    #[serde(rename = "transaction.deleted")]
    TransactionDeleted,
    /// A journal entry was created.
    #[serde(rename = "journal.created")]
    JournalCreated,
    /// A journal entry was posted.
    #[serde(rename = "journal.posted")]
    JournalPosted,
    /// A journal entry was reversed.
    #[serde(rename = "journal.reversed")]
    JournalReversed,
    /// A journal entry was approved.
    #[serde(rename = "journal.approved")]
    JournalApproved,
}

impl Topic {
    /// Dotted topic name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionCreated => "transaction.created",
            Self::TransactionUpdated => "transaction.updated",
            Self::TransactionDeleted => "transaction.deleted",
            Self::JournalCreated => "journal.created",
            Self::JournalPosted => "journal.posted",
            Self::JournalReversed => "journal.reversed",
            Self::JournalApproved => "journal.approved",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload")]
pub enum DomainEvent {
    /// `transaction.created`
    #[serde(rename = "transaction.created", rename_all = "camelCase")]
    TransactionCreated {
        /// Kind of business transaction, e.g. `PENDAPATAN_JASA`.
        source_type: String,
        /// Identifier in the originating module.
        source_id: String,
        /// Raw transaction payload.
        data: Value,
    },
    /// `transaction.updated`
    #[serde(rename = "transaction.updated", rename_all = "camelCase")]
    TransactionUpdated {
        /// Kind of business transaction.
        source_type: String,
        /// Identifier in the originating module.
        source_id: String,
        /// Payload after the change.
        new_data: Value,
    },
    /// `transaction.deleted`
    #[serde(rename = "transaction.deleted", rename_all = "camelCase")]
    TransactionDeleted {
        /// Kind of business transaction.
        source_type: String,
        /// Identifier in the originating module.
        source_id: String,
    },
    /// `journal.created`
    #[serde(rename = "journal.created", rename_all = "camelCase")]
    JournalCreated {
        /// New journal.
        journal_id: JournalId,
        /// Allocated number.
        journal_number: String,
        /// Originating transaction kind.
        source_type: Option<String>,
        /// Originating transaction id.
        source_id: Option<String>,
    },
    /// `journal.posted`
    #[serde(rename = "journal.posted", rename_all = "camelCase")]
    JournalPosted {
        /// Posted journal.
        journal_id: JournalId,
        /// Its number.
        journal_number: String,
        /// Period the journal belongs to.
        period: Period,
        /// Fiscal year.
        year: i32,
        /// Sum of debit lines.
        total_debit: Decimal,
        /// Sum of credit lines.
        total_credit: Decimal,
    },
    /// `journal.reversed`
    #[serde(rename = "journal.reversed", rename_all = "camelCase")]
    JournalReversed {
        /// Journal that was reversed.
        original_journal_id: JournalId,
        /// Mirror entry that cancels it.
        reversal_journal_id: JournalId,
        /// Reason given by the actor.
        reason: String,
    },
    /// `journal.approved`
    #[serde(rename = "journal.approved", rename_all = "camelCase")]
    JournalApproved {
        /// Approved journal.
        journal_id: JournalId,
        /// Its number.
        journal_number: String,
        /// Approving actor.
        approved_by: String,
    },
}

impl DomainEvent {
    /// Topic the event is published on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::TransactionCreated { .. } => Topic::TransactionCreated,
            Self::TransactionUpdated { .. } => Topic::TransactionUpdated,
            Self::TransactionDeleted { .. } => Topic::TransactionDeleted,
            Self::JournalCreated { .. } => Topic::JournalCreated,
            Self::JournalPosted { .. } => Topic::JournalPosted,
            Self::JournalReversed { .. } => Topic::JournalReversed,
            Self::JournalApproved { .. } => Topic::JournalApproved,
        }
    }
}
