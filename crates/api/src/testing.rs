//! Router over an in-memory store with a small BLUD chart, driven with
//! `oneshot` requests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use blud_core::account::{Account, AccountType};
use blud_core::store::{AccountStore, MemoryStore};
use blud_shared::config::PostingConfig;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::extract::ACTOR_HEADER;
use crate::{AppState, Stores, create_router};

pub(crate) const ACTOR: &str = "bendahara";

pub(crate) struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let accounts: &dyn AccountStore = store.as_ref();
        for account in chart() {
            accounts.upsert(account).await.unwrap();
        }

        let posting = PostingConfig {
            background_dispatch: false,
            ..PostingConfig::default()
        };
        let state = AppState::new(Stores::memory(&store), &posting);
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn account_id(&self, code: &str) -> String {
        self.state
            .accounts
            .find_by_code(code)
            .await
            .unwrap()
            .unwrap()
            .id
            .to_string()
    }

    async fn raw(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_HEADER, actor);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, bytes.to_vec())
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.raw(method, uri, actor, body).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(ACTOR), Some(body)).await
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, Option<String>, String) {
        let (status, content_type, bytes) = self.raw(Method::GET, uri, None, None).await;
        (status, content_type, String::from_utf8(bytes).unwrap())
    }

    /// Creates a two-line general journal dated `date`, returns its id.
    pub async fn create_journal(&self, date: &str, debit: &str, credit: &str, amount: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/journals",
                json!({
                    "entryDate": date,
                    "description": format!("{debit} / {credit}"),
                    "lines": [
                        { "accountCode": debit, "debit": amount },
                        { "accountCode": credit, "credit": amount },
                    ],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates and posts a journal, returns its id.
    pub async fn post_journal(&self, date: &str, debit: &str, credit: &str, amount: &str) -> String {
        let id = self.create_journal(date, debit, credit, amount).await;
        let (status, body) = self
            .post(&format!("/api/v1/journals/{id}/post"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        id
    }
}

/// Reads a decimal serialized as a JSON string.
pub(crate) fn amount(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

/// A rule moving 100% of the amount from 4.1.1 into 1.1.1.
pub(crate) fn rule_body(source_type: &str) -> Value {
    json!({
        "sourceType": source_type,
        "description": "Pendapatan jasa layanan",
        "debitTemplates": [
            { "accountCode": "1.1.1", "description": "Kas", "basis": { "percentage": "100" } }
        ],
        "creditTemplates": [
            { "accountCode": "4.1.1", "description": "Pendapatan", "basis": { "percentage": "100" } }
        ],
    })
}

fn chart() -> Vec<Account> {
    vec![
        Account::new("1", "Aset", AccountType::Asset, true).unwrap(),
        Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
        Account::new("1.1.2", "Bank", AccountType::Asset, false).unwrap(),
        Account::new("2.1.1", "Utang Pajak", AccountType::Liability, false).unwrap(),
        Account::new("3.1.1", "Ekuitas", AccountType::Equity, false).unwrap(),
        Account::new("4.1.1", "Pendapatan Jasa Layanan", AccountType::Revenue, false).unwrap(),
        Account::new("5.1.1", "Beban Gaji", AccountType::Expense, false).unwrap(),
    ]
}
