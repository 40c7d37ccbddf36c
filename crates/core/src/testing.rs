//! Wiring shared by the component tests: an in-memory store, a bus with
//! the general ledger subscribed, and a small BLUD chart of accounts.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::account::{Account, AccountType};
use crate::autopost::AutoPostingEngine;
use crate::events::EventBus;
use crate::general_ledger::GeneralLedgerAccumulator;
use crate::journal::{
    CreateJournalInput, EntryType, JournalEntry, JournalLedger, JournalLineInput,
};
use crate::mapping::MappingRuleService;
use crate::store::{AccountStore, MemoryStore};
use crate::trial_balance::TrialBalanceMaterializer;

pub(crate) const SYSTEM_ACTOR: &str = "system";

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub ledger: Arc<JournalLedger>,
    pub gl: Arc<GeneralLedgerAccumulator>,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let accounts: Arc<dyn AccountStore> = store.clone();
        for account in chart() {
            accounts.upsert(account).await.unwrap();
        }

        let bus = Arc::new(EventBus::new());
        let ledger = Arc::new(JournalLedger::new(
            store.clone(),
            store.clone(),
            bus.clone(),
        ));
        let gl = Arc::new(GeneralLedgerAccumulator::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        bus.subscribe(gl.clone());

        Self {
            store,
            bus,
            ledger,
            gl,
        }
    }

    /// Creates an auto-posting engine and subscribes it to the bus.
    pub fn engine(&self) -> Arc<AutoPostingEngine> {
        let engine = Arc::new(AutoPostingEngine::new(
            self.store.clone(),
            self.store.clone(),
            self.ledger.clone(),
            SYSTEM_ACTOR,
        ));
        self.bus.subscribe(engine.clone());
        engine
    }

    pub fn rules(&self) -> MappingRuleService {
        MappingRuleService::new(self.store.clone(), self.store.clone())
    }

    pub fn trial_balance(&self) -> TrialBalanceMaterializer {
        TrialBalanceMaterializer::new(self.store.clone(), self.store.clone())
    }

    pub async fn account(&self, code: &str) -> Account {
        let accounts: &dyn AccountStore = self.store.as_ref();
        accounts.find_by_code(code).await.unwrap().unwrap()
    }

    /// Creates and posts a two-line general journal.
    pub async fn post(
        &self,
        date: NaiveDate,
        debit_code: &str,
        credit_code: &str,
        amount: Decimal,
    ) -> JournalEntry {
        let created = self
            .ledger
            .create(CreateJournalInput {
                entry_date: date,
                period: None,
                entry_type: EntryType::General,
                source_type: None,
                source_id: None,
                description: format!("{debit_code} / {credit_code}"),
                lines: vec![
                    JournalLineInput::debit(debit_code, amount),
                    JournalLineInput::credit(credit_code, amount),
                ],
                created_by: "bendahara".into(),
            })
            .await
            .unwrap();
        self.ledger.post(created.entry.id, "bendahara").await.unwrap()
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn chart() -> Vec<Account> {
    vec![
        Account::new("1", "Aset", AccountType::Asset, true).unwrap(),
        Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
        Account::new("1.1.2", "Bank", AccountType::Asset, false).unwrap(),
        Account::new("1.1.9", "Kas Kecil Lama", AccountType::Asset, false)
            .unwrap()
            .deactivated(),
        Account::new("2.1.1", "Utang Pajak", AccountType::Liability, false).unwrap(),
        Account::new("3.1.1", "Ekuitas", AccountType::Equity, false).unwrap(),
        Account::new("4.1.1", "Pendapatan Jasa Layanan", AccountType::Revenue, false).unwrap(),
        Account::new("4.1.2", "Pendapatan Lain-lain", AccountType::Revenue, false).unwrap(),
        Account::new("5.1.1", "Beban Gaji", AccountType::Expense, false).unwrap(),
    ]
}
