//! Auto-posting engine.
//!
//! Reacts to transaction notifications by resolving the source type's
//! mapping rule, computing journal lines and creating and posting an `AUTO`
//! journal. Event-driven paths log and swallow every failure; the manual
//! trigger propagates them.

use std::sync::Arc;

use async_trait::async_trait;
use blud_shared::types::within_tolerance;
use serde_json::Value;
use tracing::{error, info, warn};

use super::error::AutoPostError;
use super::payload::NormalizedTransaction;
use crate::account::AccountError;
use crate::events::{DomainEvent, HandlerError, Subscriber, Topic};
use crate::journal::{
    CreateJournalInput, EntryType, JournalEntry, JournalLedger, JournalLineInput, JournalStatus,
    JournalWithLines,
};
use crate::mapping::{MappingCalculator, MappingRule};
use crate::store::{AccountStore, MappingRuleStore};

const TOPICS: &[Topic] = &[
    Topic::TransactionCreated,
    Topic::TransactionUpdated,
    Topic::TransactionDeleted,
];

/// Turns business transactions into posted journals.
pub struct AutoPostingEngine {
    rules: Arc<dyn MappingRuleStore>,
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<JournalLedger>,
    system_actor: String,
}

impl AutoPostingEngine {
    /// Creates the engine. Journals are created and posted as `system_actor`.
    pub fn new(
        rules: Arc<dyn MappingRuleStore>,
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<JournalLedger>,
        system_actor: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            accounts,
            ledger,
            system_actor: system_actor.into(),
        }
    }

    /// Handles `transaction.created`. Never fails.
    ///
    /// A source that already has a live journal is skipped, so redelivered
    /// notifications do not double post.
    pub async fn on_created(&self, source_type: &str, source_id: &str, data: &Value) {
        let Some(rule) = self.active_rule(source_type, source_id).await else {
            return;
        };
        match self.live_journal(source_type, source_id).await {
            Ok(Some(existing)) => {
                warn!(
                    source_type,
                    source_id,
                    journal_number = %existing.journal_number,
                    "Transaction already journaled, skipping"
                );
                return;
            }
            Ok(None) => {}
            Err(err) => {
                error!(source_type, source_id, error = %err, "Auto-posting failed");
                return;
            }
        }

        if let Err(err) = self.post_from_rule(&rule, source_type, source_id, data).await {
            error!(
                source_type,
                source_id,
                error_code = err.error_code(),
                error = %err,
                "Auto-posting failed"
            );
        }
    }

    /// Handles `transaction.updated`: retires the live journal and posts a
    /// fresh one from the new data. Never fails.
    ///
    /// The old journal is retired first, so an update the rule cannot post
    /// (a voided amount, an unusable account) leaves no live journal behind.
    pub async fn on_updated(&self, source_type: &str, source_id: &str, new_data: &Value) {
        let Some(rule) = self.active_rule(source_type, source_id).await else {
            warn!(source_type, source_id, "Transaction updated but no mapping rule applies");
            return;
        };

        let result: Result<_, AutoPostError> = async {
            if let Some(existing) = self.live_journal(source_type, source_id).await? {
                self.retire(existing, &format!("Updated transaction {source_id}"))
                    .await?;
            }
            self.post_from_rule(&rule, source_type, source_id, new_data)
                .await
        }
        .await;

        if let Err(err) = result {
            error!(
                source_type,
                source_id,
                error_code = err.error_code(),
                error = %err,
                "Auto-posting update failed"
            );
        }
    }

    /// Handles `transaction.deleted`: retires the live journal. Never fails.
    pub async fn on_deleted(&self, source_type: &str, source_id: &str) {
        let result: Result<_, AutoPostError> = async {
            match self.live_journal(source_type, source_id).await? {
                Some(existing) => {
                    self.retire(existing, &format!("Deleted transaction {source_id}"))
                        .await
                }
                None => {
                    info!(source_type, source_id, "Deleted transaction has no journal");
                    Ok(())
                }
            }
        }
        .await;

        if let Err(err) = result {
            error!(
                source_type,
                source_id,
                error_code = err.error_code(),
                error = %err,
                "Auto-posting delete failed"
            );
        }
    }

    /// Runs the created path synchronously and returns the posted journal.
    ///
    /// # Errors
    ///
    /// Unlike the event handlers, every failure is returned: no active rule,
    /// an existing live journal, invalid amount, unusable accounts, and
    /// ledger errors.
    pub async fn manual_auto_post(
        &self,
        source_type: &str,
        source_id: &str,
        data: &Value,
    ) -> Result<JournalWithLines, AutoPostError> {
        let rule = self
            .rules
            .find_active_by_source_type(source_type)
            .await?
            .ok_or_else(|| AutoPostError::NoActiveRule(source_type.to_string()))?;
        if let Some(existing) = self.live_journal(source_type, source_id).await? {
            return Err(AutoPostError::AlreadyPosted {
                source_type: source_type.to_string(),
                source_id: source_id.to_string(),
                journal_number: existing.journal_number,
            });
        }
        self.post_from_rule(&rule, source_type, source_id, data).await
    }

    async fn active_rule(&self, source_type: &str, source_id: &str) -> Option<MappingRule> {
        match self.rules.find_active_by_source_type(source_type).await {
            Ok(Some(rule)) => Some(rule),
            Ok(None) => {
                info!(source_type, source_id, "No active mapping rule, nothing to post");
                None
            }
            Err(err) => {
                error!(source_type, source_id, error = %err, "Mapping rule lookup failed");
                None
            }
        }
    }

    async fn live_journal(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, AutoPostError> {
        Ok(self
            .ledger
            .find_active_by_source(source_type, source_id)
            .await?)
    }

    async fn post_from_rule(
        &self,
        rule: &MappingRule,
        source_type: &str,
        source_id: &str,
        data: &Value,
    ) -> Result<JournalWithLines, AutoPostError> {
        let input = self.build_input(rule, source_type, source_id, data).await?;
        self.create_and_post(input).await
    }

    /// Builds the journal input without touching the ledger.
    async fn build_input(
        &self,
        rule: &MappingRule,
        source_type: &str,
        source_id: &str,
        data: &Value,
    ) -> Result<CreateJournalInput, AutoPostError> {
        let tx = NormalizedTransaction::from_payload(source_type, source_id, data)?;
        let preview = MappingCalculator::compute(rule, tx.amount, &tx.details);
        if !within_tolerance(preview.total_debit, preview.total_credit) {
            return Err(AutoPostError::Unbalanced {
                debit: preview.total_debit,
                credit: preview.total_credit,
            });
        }

        let mut lines = Vec::new();
        for computed in preview.into_lines() {
            let account = self
                .accounts
                .find_by_code(&computed.account_code)
                .await?
                .ok_or_else(|| AccountError::NotFound(computed.account_code.clone()))?;
            account.ensure_postable()?;
            lines.push(JournalLineInput {
                account_code: account.code,
                description: Some(computed.description),
                cost_center: None,
                debit: computed.debit,
                credit: computed.credit,
            });
        }

        Ok(CreateJournalInput {
            entry_date: tx.date,
            period: None,
            entry_type: EntryType::Auto,
            source_type: Some(source_type.to_string()),
            source_id: Some(source_id.to_string()),
            description: tx.description,
            lines,
            created_by: self.system_actor.clone(),
        })
    }

    async fn create_and_post(
        &self,
        input: CreateJournalInput,
    ) -> Result<JournalWithLines, AutoPostError> {
        let source_type = input.source_type.clone().unwrap_or_default();
        let source_id = input.source_id.clone().unwrap_or_default();

        let created = self.ledger.create(input).await?;
        let posted = self.ledger.post(created.entry.id, &self.system_actor).await?;
        info!(
            source_type = %source_type,
            source_id = %source_id,
            journal_id = %posted.id,
            journal_number = %posted.journal_number,
            "Transaction auto-posted"
        );
        Ok(JournalWithLines {
            entry: posted,
            items: created.items,
        })
    }

    /// Reverses a posted journal or deletes a draft.
    async fn retire(&self, journal: JournalEntry, reason: &str) -> Result<(), AutoPostError> {
        match journal.status {
            JournalStatus::Posted => {
                self.ledger
                    .reverse(journal.id, &self.system_actor, reason)
                    .await?;
            }
            JournalStatus::Draft => self.ledger.remove(journal.id).await?,
            JournalStatus::Cancelled => {}
        }
        Ok(())
    }
}

#[async_trait]
impl Subscriber for AutoPostingEngine {
    fn name(&self) -> &'static str {
        "auto-posting"
    }

    fn topics(&self) -> &'static [Topic] {
        TOPICS
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::TransactionCreated {
                source_type,
                source_id,
                data,
            } => self.on_created(source_type, source_id, data).await,
            DomainEvent::TransactionUpdated {
                source_type,
                source_id,
                new_data,
            } => self.on_updated(source_type, source_id, new_data).await,
            DomainEvent::TransactionDeleted {
                source_type,
                source_id,
            } => self.on_deleted(source_type, source_id).await,
            _ => {}
        }
        Ok(())
    }
}
