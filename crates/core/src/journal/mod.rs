//! Double-entry journals.
//!
//! - `types` - header, line, draft and transition types
//! - `validation` - line rules and balance check
//! - `workflow` - DRAFT → POSTED → CANCELLED state machine
//! - `reversal` - mirror entry construction
//! - `service` - [`JournalLedger`], the store-backed lifecycle operations

pub mod error;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod validation_props;

pub use error::JournalError;
pub use reversal::{REVERSAL_PREFIX, ReversalBuilder};
pub use service::{JournalLedger, ReversalOutcome};
pub use types::{
    CreateJournalInput, EntryType, JournalDraft, JournalEntry, JournalFilter, JournalLine,
    JournalLineInput, JournalNumber, JournalStatus, JournalTotals, JournalTransition,
    JournalWithLines, NewJournalLine, PostedLine, ReversalStamp, UpdateJournalInput,
};
pub use validation::JournalValidator;
pub use workflow::{JournalWorkflow, TransitionPlan};
