//! `SeaORM` entities, one module per table.
//!
//! Models mirror the migration's columns; see the repositories for meaning.

#![allow(missing_docs)]

pub mod accounts;
pub mod journal_entries;
pub mod journal_lines;
pub mod journal_sequences;
pub mod ledger_balances;
pub mod ledger_postings;
pub mod mapping_rules;
pub mod trial_balances;
