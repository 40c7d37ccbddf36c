//! Mirror entries for reversing posted journals.

use super::types::{EntryType, JournalDraft, JournalEntry, JournalLine, JournalTotals, NewJournalLine};

/// Prefix of a reversal entry's description.
pub const REVERSAL_PREFIX: &str = "REVERSAL: ";

/// Stateless builder of reversal entries.
pub struct ReversalBuilder;

impl ReversalBuilder {
    /// Builds the mirror of `original`: same date, period and source, every
    /// line with debit and credit swapped.
    #[must_use]
    pub fn build(original: &JournalEntry, lines: &[JournalLine], actor: &str) -> JournalDraft {
        let lines: Vec<NewJournalLine> = lines
            .iter()
            .map(|line| NewJournalLine {
                line_number: line.line_number,
                account_id: line.account_id,
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                cost_center: line.cost_center.clone(),
                description: line.description.clone(),
                debit: line.credit,
                credit: line.debit,
            })
            .collect();

        JournalDraft {
            entry_date: original.entry_date,
            period: original.period,
            entry_type: EntryType::Reversal,
            source_type: original.source_type.clone(),
            source_id: original.source_id.clone(),
            description: format!("{REVERSAL_PREFIX}{}", original.description),
            totals: JournalTotals::new(original.total_credit, original.total_debit),
            reversal_of: Some(original.id),
            created_by: actor.to_string(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::Period;
    use blud_shared::types::{AccountId, JournalId, JournalLineId};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line(journal_id: JournalId, n: i32, code: &str, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            journal_id,
            line_number: n,
            account_id: AccountId::new(),
            account_code: code.into(),
            account_name: code.into(),
            cost_center: None,
            description: None,
            debit,
            credit,
        }
    }

    #[test]
    fn test_mirror_swaps_every_line() {
        let draft = JournalDraft {
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            period: Period::new(2025, 3).unwrap(),
            entry_type: EntryType::Auto,
            source_type: Some("PENDAPATAN_JASA".into()),
            source_id: Some("TRX-1".into()),
            description: "Pendapatan jasa".into(),
            totals: JournalTotals::new(dec!(1000), dec!(1000)),
            reversal_of: None,
            created_by: "system".into(),
            lines: vec![],
        };
        let (original, _) = draft.into_entry(JournalId::new(), "JU/2025/03/0001".into(), Utc::now());
        let lines = vec![
            line(original.id, 1, "1.1.1", dec!(600), dec!(0)),
            line(original.id, 2, "1.1.2", dec!(400), dec!(0)),
            line(original.id, 3, "4.1.1", dec!(0), dec!(1000)),
        ];

        let mirror = ReversalBuilder::build(&original, &lines, "auditor");

        assert_eq!(mirror.entry_type, EntryType::Reversal);
        assert_eq!(mirror.description, "REVERSAL: Pendapatan jasa");
        assert_eq!(mirror.reversal_of, Some(original.id));
        assert_eq!(mirror.source_id.as_deref(), Some("TRX-1"));
        assert_eq!(mirror.period, original.period);
        assert_eq!(mirror.created_by, "auditor");
        for (orig, rev) in lines.iter().zip(&mirror.lines) {
            assert_eq!(orig.debit, rev.credit);
            assert_eq!(orig.credit, rev.debit);
            assert_eq!(orig.account_id, rev.account_id);
        }
        assert!(mirror.totals.is_balanced);
    }
}
