//! Journal ledger: creation and lifecycle of journal entries.
//!
//! Every status change goes through a compare-and-set in the store, so two
//! concurrent posts or reversals of the same journal cannot both succeed.
//! Events are published after the store has committed.

use std::collections::HashMap;
use std::sync::Arc;

use blud_shared::types::{JournalId, PageRequest, PageResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::JournalError;
use super::reversal::ReversalBuilder;
use super::types::{
    CreateJournalInput, JournalDraft, JournalEntry, JournalFilter, JournalLineInput,
    JournalTotals, JournalWithLines, NewJournalLine, ReversalStamp, UpdateJournalInput,
};
use super::validation::JournalValidator;
use super::workflow::JournalWorkflow;
use crate::account::Account;
use crate::events::{DomainEvent, Publisher};
use crate::fiscal::Period;
use crate::store::{AccountStore, JournalStore};

/// Both sides of a completed reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalOutcome {
    /// The original journal, now cancelled.
    pub original: JournalEntry,
    /// The posted mirror entry.
    pub reversal: JournalEntry,
}

/// Journal ledger over a journal store and the chart of accounts.
pub struct JournalLedger {
    journals: Arc<dyn JournalStore>,
    accounts: Arc<dyn AccountStore>,
    publisher: Arc<dyn Publisher>,
}

impl JournalLedger {
    /// Creates the ledger.
    pub fn new(
        journals: Arc<dyn JournalStore>,
        accounts: Arc<dyn AccountStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            journals,
            accounts,
            publisher,
        }
    }

    /// Validates and stores a new journal in `DRAFT`.
    ///
    /// The period defaults to the month of the entry date.
    pub async fn create(&self, input: CreateJournalInput) -> Result<JournalWithLines, JournalError> {
        let (lines, totals) = self.resolve(&input.lines).await?;

        let draft = JournalDraft {
            entry_date: input.entry_date,
            period: input
                .period
                .unwrap_or_else(|| Period::from_date(input.entry_date)),
            entry_type: input.entry_type,
            source_type: input.source_type,
            source_id: input.source_id,
            description: input.description,
            totals,
            reversal_of: None,
            created_by: input.created_by,
            lines,
        };
        let entry = self.journals.insert(draft).await?;
        info!(
            journal_id = %entry.id,
            journal_number = %entry.journal_number,
            entry_type = %entry.entry_type,
            "Journal created"
        );

        self.publisher.publish(created_event(&entry)).await;
        self.with_lines(entry).await
    }

    /// Changes a draft. Replacement lines are validated like on create.
    pub async fn update(
        &self,
        id: JournalId,
        input: UpdateJournalInput,
    ) -> Result<JournalWithLines, JournalError> {
        let current = self.entry(id).await?;
        JournalWorkflow::ensure_editable(&current)?;

        let (lines, totals) = match &input.lines {
            Some(lines) => self.resolve(lines).await?,
            None => {
                let kept = self
                    .journals
                    .find_lines(id)
                    .await?
                    .into_iter()
                    .map(|l| NewJournalLine {
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
                (kept, current.totals())
            }
        };

        let entry_date = input.entry_date.unwrap_or(current.entry_date);
        let period = match (input.period, input.entry_date) {
            (Some(period), _) => period,
            (None, Some(date)) => Period::from_date(date),
            (None, None) => current.period,
        };

        let draft = JournalDraft {
            entry_date,
            period,
            entry_type: current.entry_type,
            source_type: current.source_type.clone(),
            source_id: current.source_id.clone(),
            description: input.description.unwrap_or(current.description),
            totals,
            reversal_of: current.reversal_of,
            created_by: current.created_by,
            lines,
        };
        let entry = self.journals.replace_draft(id, draft).await?;
        info!(journal_id = %id, journal_number = %entry.journal_number, "Journal updated");
        self.with_lines(entry).await
    }

    /// Deletes a draft with its lines.
    pub async fn remove(&self, id: JournalId) -> Result<(), JournalError> {
        let current = self.entry(id).await?;
        JournalWorkflow::ensure_editable(&current)?;
        self.journals.delete_draft(id).await?;
        info!(journal_id = %id, journal_number = %current.journal_number, "Journal deleted");
        Ok(())
    }

    /// Draft → Posted. Emits `journal.posted`.
    pub async fn post(&self, id: JournalId, actor: &str) -> Result<JournalEntry, JournalError> {
        let current = self.entry(id).await?;
        let plan = JournalWorkflow::post(&current, actor, Utc::now())?;
        let entry = self
            .journals
            .transition(id, plan.expected, plan.change)
            .await?;
        info!(journal_id = %id, journal_number = %entry.journal_number, actor, "Journal posted");

        self.publisher.publish(posted_event(&entry)).await;
        Ok(entry)
    }

    /// Marks a manual journal approved, posting it if it is still a draft.
    ///
    /// Emits `journal.approved`, and `journal.posted` when it posted.
    pub async fn approve(&self, id: JournalId, actor: &str) -> Result<JournalEntry, JournalError> {
        let current = self.entry(id).await?;
        let plan = JournalWorkflow::approve(&current, actor, Utc::now())?;
        let posts = plan.posts();
        let entry = self
            .journals
            .transition(id, plan.expected, plan.change)
            .await?;
        info!(
            journal_id = %id,
            journal_number = %entry.journal_number,
            actor,
            posted = posts,
            "Journal approved"
        );

        self.publisher
            .publish(DomainEvent::JournalApproved {
                journal_id: entry.id,
                journal_number: entry.journal_number.clone(),
                approved_by: actor.to_string(),
            })
            .await;
        if posts {
            self.publisher.publish(posted_event(&entry)).await;
        }
        Ok(entry)
    }

    /// Cancels a posted journal through a posted mirror entry.
    ///
    /// Emits `journal.created` and `journal.posted` for the mirror, then
    /// `journal.reversed`.
    pub async fn reverse(
        &self,
        id: JournalId,
        actor: &str,
        reason: &str,
    ) -> Result<ReversalOutcome, JournalError> {
        let current = self.entry(id).await?;
        JournalWorkflow::check_reverse(&current, reason)?;

        let lines = self.journals.find_lines(id).await?;
        let mirror = ReversalBuilder::build(&current, &lines, actor);
        let stamp = ReversalStamp {
            actor: actor.to_string(),
            reason: reason.trim().to_string(),
            at: Utc::now(),
        };
        let (original, reversal) = self.journals.insert_reversal(id, mirror, stamp).await?;
        info!(
            journal_id = %id,
            journal_number = %original.journal_number,
            reversal_number = %reversal.journal_number,
            actor,
            "Journal reversed"
        );

        self.publisher.publish(created_event(&reversal)).await;
        self.publisher.publish(posted_event(&reversal)).await;
        self.publisher
            .publish(DomainEvent::JournalReversed {
                original_journal_id: original.id,
                reversal_journal_id: reversal.id,
                reason: reason.trim().to_string(),
            })
            .await;
        Ok(ReversalOutcome { original, reversal })
    }

    /// Journal header with its lines.
    pub async fn get(&self, id: JournalId) -> Result<JournalWithLines, JournalError> {
        let entry = self.entry(id).await?;
        self.with_lines(entry).await
    }

    /// Filtered page of journal headers, newest first.
    pub async fn list(
        &self,
        filter: &JournalFilter,
        page: PageRequest,
    ) -> Result<PageResponse<JournalEntry>, JournalError> {
        let page = page.normalized();
        let (items, total) = self.journals.list(filter, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// The live journal of a source transaction, if any.
    pub async fn find_active_by_source(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, JournalError> {
        Ok(self
            .journals
            .find_active_by_source(source_type, source_id)
            .await?)
    }

    async fn entry(&self, id: JournalId) -> Result<JournalEntry, JournalError> {
        self.journals
            .find(id)
            .await?
            .ok_or(JournalError::NotFound(id))
    }

    async fn with_lines(&self, entry: JournalEntry) -> Result<JournalWithLines, JournalError> {
        let items = self.journals.find_lines(entry.id).await?;
        Ok(JournalWithLines { entry, items })
    }

    async fn resolve(
        &self,
        lines: &[JournalLineInput],
    ) -> Result<(Vec<NewJournalLine>, JournalTotals), JournalError> {
        let mut chart: HashMap<String, Account> = HashMap::new();
        for line in lines {
            let code = line.account_code.trim();
            if chart.contains_key(code) {
                continue;
            }
            match self.accounts.find_by_code(code).await? {
                Some(account) => {
                    chart.insert(code.to_string(), account);
                }
                None => warn!(account_code = code, "Journal line references unknown account"),
            }
        }
        JournalValidator::resolve_lines(lines, |code| chart.get(code))
    }
}

fn created_event(entry: &JournalEntry) -> DomainEvent {
    DomainEvent::JournalCreated {
        journal_id: entry.id,
        journal_number: entry.journal_number.clone(),
        source_type: entry.source_type.clone(),
        source_id: entry.source_id.clone(),
    }
}

fn posted_event(entry: &JournalEntry) -> DomainEvent {
    DomainEvent::JournalPosted {
        journal_id: entry.id,
        journal_number: entry.journal_number.clone(),
        period: entry.period,
        year: entry.year,
        total_debit: entry.total_debit,
        total_credit: entry.total_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use crate::events::{EventBus, HandlerError, Subscriber, Topic};
    use crate::journal::{EntryType, JournalStatus};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        topics: Mutex<Vec<Topic>>,
    }

    #[async_trait]
    impl Subscriber for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn topics(&self) -> &'static [Topic] {
            &[
                Topic::JournalCreated,
                Topic::JournalPosted,
                Topic::JournalReversed,
                Topic::JournalApproved,
            ]
        }

        async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
            self.topics.lock().unwrap().push(event.topic());
            Ok(())
        }
    }

    async fn ledger() -> (JournalLedger, Arc<Recorder>) {
        let store = Arc::new(MemoryStore::new());
        let accounts: Arc<dyn AccountStore> = store.clone();
        for account in [
            Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
            Account::new("4.1.1", "Pendapatan Jasa", AccountType::Revenue, false).unwrap(),
        ] {
            accounts.upsert(account).await.unwrap();
        }
        let bus = Arc::new(EventBus::new());
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(recorder.clone());
        (JournalLedger::new(store, accounts, bus), recorder)
    }

    fn input(amount: rust_decimal::Decimal) -> CreateJournalInput {
        CreateJournalInput {
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            period: None,
            entry_type: EntryType::General,
            source_type: None,
            source_id: None,
            description: "Setoran kas".into(),
            lines: vec![
                JournalLineInput::debit("1.1.1", amount),
                JournalLineInput::credit("4.1.1", amount),
            ],
            created_by: "admin".into(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_number_and_period() {
        let (ledger, recorder) = ledger().await;
        let journal = ledger.create(input(dec!(1000))).await.unwrap();

        assert_eq!(journal.entry.journal_number, "JU/2025/03/0001");
        assert_eq!(journal.entry.period.to_string(), "2025-03");
        assert_eq!(journal.entry.status, JournalStatus::Draft);
        assert_eq!(journal.items.len(), 2);
        assert_eq!(*recorder.topics.lock().unwrap(), vec![Topic::JournalCreated]);
    }

    #[tokio::test]
    async fn test_update_and_delete_only_while_draft() {
        let (ledger, _) = ledger().await;
        let journal = ledger.create(input(dec!(1000))).await.unwrap();
        let id = journal.entry.id;

        let updated = ledger
            .update(
                id,
                UpdateJournalInput {
                    description: Some("Koreksi".into()),
                    lines: Some(vec![
                        JournalLineInput::debit("1.1.1", dec!(750)),
                        JournalLineInput::credit("4.1.1", dec!(750)),
                    ]),
                    ..UpdateJournalInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.entry.description, "Koreksi");
        assert_eq!(updated.entry.total_debit, dec!(750));
        assert_eq!(updated.entry.journal_number, journal.entry.journal_number);

        ledger.post(id, "admin").await.unwrap();
        assert!(matches!(
            ledger.update(id, UpdateJournalInput::default()).await,
            Err(JournalError::NotDraft(JournalStatus::Posted))
        ));
        assert!(matches!(ledger.remove(id).await, Err(JournalError::NotDraft(_))));

        let other = ledger.create(input(dec!(5))).await.unwrap();
        ledger.remove(other.entry.id).await.unwrap();
        assert!(matches!(
            ledger.get(other.entry.id).await,
            Err(JournalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_double_post_rejected() {
        let (ledger, recorder) = ledger().await;
        let journal = ledger.create(input(dec!(1000))).await.unwrap();

        let posted = ledger.post(journal.entry.id, "admin").await.unwrap();
        assert!(posted.is_posted);
        assert_eq!(posted.posted_by.as_deref(), Some("admin"));
        assert!(ledger.post(journal.entry.id, "admin").await.is_err());

        let posted_events = recorder
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == Topic::JournalPosted)
            .count();
        assert_eq!(posted_events, 1);
    }

    #[tokio::test]
    async fn test_concurrent_posts_publish_once() {
        let (ledger, recorder) = ledger().await;
        let ledger = Arc::new(ledger);
        let id = ledger.create(input(dec!(1000))).await.unwrap().entry.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.post(id, "admin").await.is_ok() })
            })
            .collect();
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        let posted_events = recorder
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == Topic::JournalPosted)
            .count();
        assert_eq!(posted_events, 1);
    }

    #[tokio::test]
    async fn test_approve_draft_posts() {
        let (ledger, recorder) = ledger().await;
        let id = ledger.create(input(dec!(1000))).await.unwrap().entry.id;

        let approved = ledger.approve(id, "kepala").await.unwrap();
        assert!(approved.is_approved);
        assert_eq!(approved.status, JournalStatus::Posted);
        assert!(matches!(
            ledger.approve(id, "kepala").await,
            Err(JournalError::AlreadyApproved)
        ));
        assert_eq!(
            *recorder.topics.lock().unwrap(),
            vec![Topic::JournalCreated, Topic::JournalApproved, Topic::JournalPosted]
        );
    }

    #[tokio::test]
    async fn test_reverse_creates_posted_mirror() {
        let (ledger, recorder) = ledger().await;
        let id = ledger.create(input(dec!(1000))).await.unwrap().entry.id;
        assert!(matches!(
            ledger.reverse(id, "admin", "salah input").await,
            Err(JournalError::NotPosted)
        ));
        ledger.post(id, "admin").await.unwrap();

        let outcome = ledger.reverse(id, "admin", "salah input").await.unwrap();
        assert_eq!(outcome.original.status, JournalStatus::Cancelled);
        assert!(outcome.original.is_reversed);
        assert_eq!(outcome.original.reversal_journal_id, Some(outcome.reversal.id));
        assert_eq!(outcome.reversal.status, JournalStatus::Posted);
        assert_eq!(outcome.reversal.entry_type, EntryType::Reversal);
        assert_eq!(outcome.reversal.journal_number, "JU/2025/03/0002");

        let mirror = ledger.get(outcome.reversal.id).await.unwrap();
        assert_eq!(mirror.items[0].credit, dec!(1000));
        assert_eq!(mirror.items[1].debit, dec!(1000));

        assert!(matches!(
            ledger.reverse(id, "admin", "lagi").await,
            Err(JournalError::AlreadyReversed)
        ));
        assert_eq!(
            recorder.topics.lock().unwrap()[2..],
            [Topic::JournalCreated, Topic::JournalPosted, Topic::JournalReversed]
        );
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let (ledger, _) = ledger().await;
        for amount in [dec!(1), dec!(2), dec!(3)] {
            ledger.create(input(amount)).await.unwrap();
        }
        let page = ledger
            .list(&JournalFilter::default(), PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(page.data[0].journal_number, "JU/2025/03/0003");

        let filter = JournalFilter {
            status: Some(JournalStatus::Posted),
            ..JournalFilter::default()
        };
        let page = ledger.list(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.meta.total, 0);
    }
}
