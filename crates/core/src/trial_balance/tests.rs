//! Trial balance scenarios over ledger balances built by real postings.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::TrialBalanceError;
use crate::account::AccountType;
use crate::fiscal::Period;
use crate::testing::{Harness, date};

fn march() -> Period {
    Period::new(2025, 3).unwrap()
}

fn april() -> Period {
    Period::new(2025, 4).unwrap()
}

async fn march_activity() -> Harness {
    let h = Harness::new().await;
    h.post(date(2025, 3, 10), "1.1.1", "4.1.1", dec!(1000)).await;
    h.post(date(2025, 3, 20), "5.1.1", "1.1.1", dec!(300)).await;
    h
}

#[tokio::test]
async fn test_generate_maps_closing_balances_to_columns() {
    let h = march_activity().await;
    let outcome = h.trial_balance().generate(march()).await.unwrap();

    assert_eq!(outcome.rows_generated, 3);
    assert_eq!(outcome.discarded_adjustments, 0);
    assert_eq!(outcome.summary.total_debet, dec!(1000));
    assert_eq!(outcome.summary.total_kredit, dec!(1000));
    assert!(outcome.summary.is_balanced);

    let report = h.trial_balance().get(march()).await.unwrap();
    let kas = &report.rows[0];
    assert_eq!(kas.account_code, "1.1.1");
    assert_eq!((kas.debit, kas.credit), (dec!(700), dec!(0)));
    assert_eq!(kas.debit_adjusted, kas.debit);
    let pendapatan = &report.rows[1];
    assert_eq!((pendapatan.debit, pendapatan.credit), (dec!(0), dec!(1000)));
}

#[tokio::test]
async fn test_contra_balance_lands_on_opposite_column() {
    let h = Harness::new().await;
    h.post(date(2025, 3, 5), "1.1.2", "1.1.1", dec!(500)).await;

    let report = h.trial_balance().get(march()).await.unwrap();
    let kas = report.rows.iter().find(|r| r.account_code == "1.1.1").unwrap();
    assert_eq!(kas.debit, dec!(0));
    assert_eq!(kas.credit, dec!(500));
    assert!(report.summary.is_balanced);
}

#[tokio::test]
async fn test_get_materializes_once_and_keeps_snapshot() {
    let h = march_activity().await;
    let tb = h.trial_balance();

    let first = tb.get(march()).await.unwrap();
    assert_eq!(first.rows.len(), 3);

    h.post(date(2025, 3, 25), "1.1.1", "4.1.2", dec!(50)).await;
    let stale = tb.get(march()).await.unwrap();
    assert_eq!(stale.rows.len(), 3);

    tb.generate(march()).await.unwrap();
    let fresh = tb.get(march()).await.unwrap();
    assert_eq!(fresh.rows.len(), 4);
    assert_eq!(fresh.summary.total_debet, dec!(1050));
}

#[tokio::test]
async fn test_empty_period_has_no_rows() {
    let h = Harness::new().await;
    let report = h.trial_balance().get(march()).await.unwrap();
    assert!(report.rows.is_empty());
    assert!(report.summary.is_balanced);
}

#[tokio::test]
async fn test_adjustments_accumulate_and_are_dropped_on_regenerate() {
    let h = march_activity().await;
    let tb = h.trial_balance();
    tb.generate(march()).await.unwrap();
    let kas = h.account("1.1.1").await;

    tb.record_adjustment(march(), kas.id, dec!(25), dec!(0))
        .await
        .unwrap();
    let row = tb
        .record_adjustment(march(), kas.id, dec!(0), dec!(5))
        .await
        .unwrap();
    assert_eq!(row.debit_adjusted, dec!(725));
    assert_eq!(row.credit_adjusted, dec!(5));

    let report = tb.get(march()).await.unwrap();
    assert_eq!(report.summary.total_debet, dec!(1000));
    assert_eq!(report.summary.total_debet_adjusted, dec!(1025));

    let bank = h.account("1.1.2").await;
    let err = tb
        .record_adjustment(march(), bank.id, dec!(1), dec!(0))
        .await
        .unwrap_err();
    assert!(matches!(err, TrialBalanceError::RowNotFound { .. }));
    assert_eq!(err.http_status_code(), 400);

    let err = tb
        .record_adjustment(march(), kas.id, dec!(0.125), dec!(0))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_ADJUSTMENT_AMOUNT");
    assert_eq!(
        tb.get(march()).await.unwrap().summary.total_debet_adjusted,
        dec!(1025)
    );

    let outcome = tb.generate(march()).await.unwrap();
    assert_eq!(outcome.discarded_adjustments, 1);
    let regenerated = tb.get(march()).await.unwrap();
    assert!(regenerated.rows.iter().all(|r| !r.has_adjustment()));
}

#[tokio::test]
async fn test_grouped_follows_classification_order() {
    let h = march_activity().await;
    let grouped = h.trial_balance().get_grouped(march()).await.unwrap();

    let order: Vec<_> = grouped.groups.iter().map(|g| g.account_type).collect();
    assert_eq!(
        order,
        vec![AccountType::Asset, AccountType::Revenue, AccountType::Expense]
    );
    assert_eq!(grouped.groups[0].label, "Aset");
    assert_eq!(grouped.groups[2].subtotal.total_debet, dec!(300));
    assert!(grouped.summary.is_balanced);
}

#[tokio::test]
async fn test_compare_reports_change_per_account() {
    let h = Harness::new().await;
    h.post(date(2025, 3, 10), "1.1.1", "4.1.1", dec!(1000)).await;
    h.post(date(2025, 4, 10), "1.1.1", "4.1.1", dec!(500)).await;
    h.post(date(2025, 4, 11), "5.1.1", "1.1.2", dec!(80)).await;

    let comparison = h.trial_balance().compare(march(), april()).await.unwrap();
    let codes: Vec<_> = comparison
        .accounts
        .iter()
        .map(|a| a.account_code.as_str())
        .collect();
    assert_eq!(codes, vec!["1.1.1", "1.1.2", "4.1.1", "5.1.1"]);

    let kas = &comparison.accounts[0];
    assert_eq!(kas.base_balance, dec!(1000));
    assert_eq!(kas.compare_balance, dec!(1500));
    assert_eq!(kas.change, dec!(500));
    assert_eq!(kas.change_percentage, dec!(50));

    let pendapatan = &comparison.accounts[2];
    assert_eq!(pendapatan.base_balance, dec!(-1000));
    assert_eq!(pendapatan.change_percentage, dec!(-50));

    let beban = &comparison.accounts[3];
    assert_eq!(beban.base_balance, dec!(0));
    assert_eq!(beban.change_percentage, dec!(0));
}

#[tokio::test]
async fn test_trend_across_periods() {
    let h = Harness::new().await;
    h.post(date(2025, 3, 10), "1.1.1", "4.1.1", dec!(1000)).await;
    h.post(date(2025, 4, 10), "1.1.1", "4.1.1", dec!(500)).await;
    let tb = h.trial_balance();
    tb.generate(march()).await.unwrap();
    tb.generate(april()).await.unwrap();
    let kas = h.account("1.1.1").await;

    let all = tb.trend(march(), april(), None).await.unwrap();
    assert_eq!(all.len(), 2);

    let trend = tb.trend(march(), april(), Some(&[kas.id])).await.unwrap();
    assert_eq!(trend.len(), 1);
    let debits: Vec<_> = trend[0].points.iter().map(|p| p.debit).collect();
    assert_eq!(debits, vec![dec!(1000), dec!(1500)]);

    assert!(matches!(
        tb.trend(april(), march(), None).await,
        Err(TrialBalanceError::InvalidRange { .. })
    ));
}

#[tokio::test]
async fn test_export_grouped_csv() {
    let h = march_activity().await;
    let csv = h.trial_balance().export_csv(march(), true).await.unwrap();

    assert!(csv.starts_with("Kode Akun,"));
    assert!(csv.contains("Subtotal Aset"));
    assert!(csv.contains("Subtotal Beban"));
    assert!(csv.trim_end().ends_with(",TOTAL,,1000,1000,0,0,1000,1000"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Each generated row's `debit - credit` equals the ledger closing
    /// balance expressed on the debit side.
    #[test]
    fn test_rows_reproduce_ledger_balances(
        entries in prop::collection::vec((0usize..4, 0usize..4, 1i64..5_000_000), 1..10)
    ) {
        const CODES: [&str; 4] = ["1.1.1", "2.1.1", "4.1.1", "5.1.1"];
        let checks = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let h = Harness::new().await;
                for (debit, credit, cents) in &entries {
                    if debit != credit {
                        h.post(date(2025, 3, 15), CODES[*debit], CODES[*credit], Decimal::new(*cents, 2))
                            .await;
                    }
                }
                let tb = h.trial_balance();
                tb.generate(march()).await.unwrap();
                let rows = tb.get(march()).await.unwrap().rows;
                let balances = h.gl.by_period(march()).await.unwrap();
                rows.iter()
                    .map(|row| {
                        let balance = balances
                            .iter()
                            .find(|b| b.account_id == row.account_id)
                            .unwrap();
                        (row.net(), balance.normal_balance.signed_debit(balance.closing_balance))
                    })
                    .collect::<Vec<_>>()
            });
        for (net, expected) in checks {
            prop_assert_eq!(net, expected);
        }
    }
}
