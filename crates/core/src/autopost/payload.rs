//! Normalization of heterogeneous transaction payloads.
//!
//! Business modules name the same field differently. Each logical field is
//! read from a fixed list of candidate keys, first match wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::error::AutoPostError;
use crate::mapping::condition::as_decimal;

const DATE_FIELDS: &[&str] = &[
    "tanggal",
    "tanggalTransaksi",
    "transactionDate",
    "date",
    "createdAt",
];
const DESCRIPTION_FIELDS: &[&str] = &["uraian", "keterangan", "description", "deskripsi"];
const AMOUNT_FIELDS: &[&str] = &["jumlah", "nilai", "amount", "total", "nominal"];

/// A transaction payload reduced to what auto-posting needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTransaction {
    /// Transaction date; today when the payload has none.
    pub date: NaiveDate,
    /// Narrative for the journal header.
    pub description: String,
    /// Positive transaction total.
    pub amount: Decimal,
    /// The whole payload, for template conditions.
    pub details: Map<String, Value>,
}

impl NormalizedTransaction {
    /// Normalizes `data` sent for `source_type`/`source_id`.
    ///
    /// # Errors
    ///
    /// Fails if no amount field holds a positive number.
    pub fn from_payload(
        source_type: &str,
        source_id: &str,
        data: &Value,
    ) -> Result<Self, AutoPostError> {
        let details = data.as_object().cloned().unwrap_or_default();

        let date = first(&details, DATE_FIELDS)
            .and_then(parse_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let description = first(&details, DESCRIPTION_FIELDS)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("{source_type} {source_id}"), str::to_string);

        let raw_amount = first(&details, AMOUNT_FIELDS);
        let amount = raw_amount
            .and_then(as_decimal)
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| {
                AutoPostError::InvalidAmount(
                    raw_amount.map_or_else(|| "nothing".to_string(), Value::to_string),
                )
            })?;

        Ok(Self {
            date,
            description,
            amount,
            details,
        })
    }
}

fn first<'a>(details: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| details.get(*k))
        .find(|v| !v.is_null())
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|d| d.date())
        })
}
