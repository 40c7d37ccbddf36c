//! Property-based tests for the general ledger accumulator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::BalanceFigures;
use crate::fiscal::Period;
use crate::testing::{Harness, date};

const CODES: [&str; 5] = ["1.1.1", "1.1.2", "2.1.1", "4.1.1", "5.1.1"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// (debit account, credit account, amount in cents, day of March)
fn postings() -> impl Strategy<Value = Vec<(usize, usize, i64, u32)>> {
    prop::collection::vec((0..CODES.len(), 0..CODES.len(), 1i64..10_000_000, 1u32..=31), 1..12)
        .prop_map(|v| v.into_iter().filter(|(d, c, _, _)| d != c).collect())
}

async fn snapshot(h: &Harness, period: Period) -> Vec<BalanceFigures> {
    let mut rows: Vec<_> = h
        .gl
        .by_period(period)
        .await
        .unwrap()
        .iter()
        .map(super::LedgerBalance::figures)
        .collect();
    rows.sort();
    rows
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rebuilding a period from its posted journals reproduces the balances
    /// accumulated one journal at a time.
    #[test]
    fn test_rebuild_reproduces_incremental(entries in postings()) {
        let (incremental, rebuilt) = runtime().block_on(async {
            let h = Harness::new().await;
            let march = Period::new(2025, 3).unwrap();
            for (debit, credit, cents, day) in &entries {
                h.post(date(2025, 3, *day), CODES[*debit], CODES[*credit], Decimal::new(*cents, 2))
                    .await;
            }
            let incremental = snapshot(&h, march).await;
            h.gl.rebuild_for_period(march).await.unwrap();
            (incremental, snapshot(&h, march).await)
        });
        prop_assert_eq!(incremental, rebuilt);
    }

    /// Movements applied in any order give the same rows, and total debits
    /// equal total credits across the period.
    #[test]
    fn test_movement_order_does_not_matter(
        entries in postings().prop_flat_map(|v| {
            let shuffled = Just(v.clone()).prop_shuffle();
            (Just(v), shuffled)
        })
    ) {
        let (original, shuffled) = entries;
        let run = |movements: Vec<(usize, usize, i64, u32)>| runtime().block_on(async move {
            let h = Harness::new().await;
            let march = Period::new(2025, 3).unwrap();
            for (debit, credit, cents, _) in movements {
                let amount = Decimal::new(cents, 2);
                let debit = h.account(CODES[debit]).await;
                let credit = h.account(CODES[credit]).await;
                h.gl.update_gl_entry(debit.id, march, amount, Decimal::ZERO).await.unwrap();
                h.gl.update_gl_entry(credit.id, march, Decimal::ZERO, amount).await.unwrap();
            }
            h.gl.by_period(march)
                .await
                .unwrap()
                .into_iter()
                .map(|r| (r.account_code, r.period_debit, r.period_credit, r.closing_balance))
                .collect::<Vec<_>>()
        });

        let a = run(original);
        let b = run(shuffled);
        prop_assert_eq!(&a, &b);

        let debit: Decimal = a.iter().map(|(_, d, _, _)| *d).sum();
        let credit: Decimal = a.iter().map(|(_, _, c, _)| *c).sum();
        prop_assert_eq!(debit, credit);
    }
}
