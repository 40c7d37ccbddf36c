//! Journal lifecycle state machine.
//!
//! Each check returns the status the store must still observe and the change
//! to apply, so the caller can hand both to a compare-and-set.

use chrono::{DateTime, Utc};

use super::error::JournalError;
use super::types::{EntryType, JournalEntry, JournalStatus, JournalTransition};

/// A validated status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Status the journal must still have when the change is applied.
    pub expected: JournalStatus,
    /// The change.
    pub change: JournalTransition,
}

impl TransitionPlan {
    /// Returns true if applying the plan moves the journal to `POSTED`.
    #[must_use]
    pub fn posts(&self) -> bool {
        match &self.change {
            JournalTransition::Post { .. } => true,
            JournalTransition::Approve { post, .. } => *post,
        }
    }
}

/// Stateless lifecycle rules.
pub struct JournalWorkflow;

impl JournalWorkflow {
    /// Update and delete are only allowed on drafts.
    pub fn ensure_editable(entry: &JournalEntry) -> Result<(), JournalError> {
        if entry.status.is_editable() {
            Ok(())
        } else {
            Err(JournalError::NotDraft(entry.status))
        }
    }

    /// Draft → Posted.
    pub fn post(
        entry: &JournalEntry,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionPlan, JournalError> {
        if entry.status != JournalStatus::Draft {
            return Err(JournalError::InvalidTransition {
                from: entry.status,
                action: "post",
            });
        }
        if !entry.is_balanced {
            return Err(JournalError::Unbalanced {
                debit: entry.total_debit,
                credit: entry.total_credit,
            });
        }
        Ok(TransitionPlan {
            expected: JournalStatus::Draft,
            change: JournalTransition::Post {
                actor: actor.to_string(),
                at,
            },
        })
    }

    /// Marks a manual journal approved. A draft is posted in the same step.
    pub fn approve(
        entry: &JournalEntry,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionPlan, JournalError> {
        if entry.entry_type == EntryType::Auto {
            return Err(JournalError::ApprovalNotAllowed);
        }
        if entry.is_approved {
            return Err(JournalError::AlreadyApproved);
        }
        let post = match entry.status {
            JournalStatus::Draft => {
                if !entry.is_balanced {
                    return Err(JournalError::Unbalanced {
                        debit: entry.total_debit,
                        credit: entry.total_credit,
                    });
                }
                true
            }
            JournalStatus::Posted => false,
            JournalStatus::Cancelled => {
                return Err(JournalError::InvalidTransition {
                    from: entry.status,
                    action: "approve",
                });
            }
        };
        Ok(TransitionPlan {
            expected: entry.status,
            change: JournalTransition::Approve {
                actor: actor.to_string(),
                at,
                post,
            },
        })
    }

    /// Posted → Cancelled, through a mirror entry.
    pub fn check_reverse(entry: &JournalEntry, reason: &str) -> Result<(), JournalError> {
        if reason.trim().is_empty() {
            return Err(JournalError::ReasonRequired);
        }
        if entry.is_reversed {
            return Err(JournalError::AlreadyReversed);
        }
        if entry.status != JournalStatus::Posted {
            return Err(JournalError::NotPosted);
        }
        Ok(())
    }

    /// Returns true if `to` is reachable from `from` in one step.
    #[must_use]
    pub fn is_valid_transition(from: JournalStatus, to: JournalStatus) -> bool {
        matches!(
            (from, to),
            (JournalStatus::Draft, JournalStatus::Posted)
                | (JournalStatus::Posted, JournalStatus::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::Period;
    use crate::journal::{JournalDraft, JournalTotals};
    use blud_shared::types::JournalId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(entry_type: EntryType) -> JournalEntry {
        let draft = JournalDraft {
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            period: Period::new(2025, 3).unwrap(),
            entry_type,
            source_type: None,
            source_id: None,
            description: "Test".into(),
            totals: JournalTotals::new(dec!(100), dec!(100)),
            reversal_of: None,
            created_by: "tester".into(),
            lines: vec![],
        };
        draft
            .into_entry(JournalId::new(), "JU/2025/03/0001".into(), Utc::now())
            .0
    }

    #[test]
    fn test_post_only_from_draft() {
        let mut e = entry(EntryType::General);
        let plan = JournalWorkflow::post(&e, "a", Utc::now()).unwrap();
        assert_eq!(plan.expected, JournalStatus::Draft);
        assert!(plan.posts());

        plan.change.apply(&mut e);
        assert!(matches!(
            JournalWorkflow::post(&e, "a", Utc::now()),
            Err(JournalError::InvalidTransition { from: JournalStatus::Posted, .. })
        ));
    }

    #[test]
    fn test_approve_draft_also_posts() {
        let e = entry(EntryType::General);
        let plan = JournalWorkflow::approve(&e, "boss", Utc::now()).unwrap();
        assert!(plan.posts());
        assert_eq!(plan.expected, JournalStatus::Draft);
    }

    #[test]
    fn test_approve_posted_does_not_repost() {
        let mut e = entry(EntryType::General);
        JournalWorkflow::post(&e, "a", Utc::now())
            .unwrap()
            .change
            .apply(&mut e);
        let plan = JournalWorkflow::approve(&e, "boss", Utc::now()).unwrap();
        assert!(!plan.posts());
        assert_eq!(plan.expected, JournalStatus::Posted);

        plan.change.apply(&mut e);
        assert!(matches!(
            JournalWorkflow::approve(&e, "boss", Utc::now()),
            Err(JournalError::AlreadyApproved)
        ));
    }

    #[test]
    fn test_auto_journals_skip_approval() {
        let e = entry(EntryType::Auto);
        assert!(matches!(
            JournalWorkflow::approve(&e, "boss", Utc::now()),
            Err(JournalError::ApprovalNotAllowed)
        ));
    }

    #[test]
    fn test_reverse_checks() {
        let mut e = entry(EntryType::General);
        assert!(matches!(
            JournalWorkflow::check_reverse(&e, "oops"),
            Err(JournalError::NotPosted)
        ));
        JournalWorkflow::post(&e, "a", Utc::now())
            .unwrap()
            .change
            .apply(&mut e);
        assert!(matches!(
            JournalWorkflow::check_reverse(&e, "  "),
            Err(JournalError::ReasonRequired)
        ));
        assert!(JournalWorkflow::check_reverse(&e, "oops").is_ok());

        e.is_reversed = true;
        assert!(matches!(
            JournalWorkflow::check_reverse(&e, "oops"),
            Err(JournalError::AlreadyReversed)
        ));
    }

    #[test]
    fn test_edit_only_drafts() {
        let mut e = entry(EntryType::General);
        assert!(JournalWorkflow::ensure_editable(&e).is_ok());
        e.status = JournalStatus::Cancelled;
        assert!(matches!(
            JournalWorkflow::ensure_editable(&e),
            Err(JournalError::NotDraft(JournalStatus::Cancelled))
        ));
    }
}
