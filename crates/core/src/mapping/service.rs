//! Mapping rule administration.

use std::sync::Arc;

use blud_shared::types::MappingRuleId;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::calculator::MappingCalculator;
use super::error::MappingError;
use super::types::{MappingPreview, MappingRule, MappingRuleInput, Side};
use crate::account::AccountError;
use crate::store::{AccountStore, MappingRuleStore};

/// CRUD and preview of mapping rules.
pub struct MappingRuleService {
    rules: Arc<dyn MappingRuleStore>,
    accounts: Arc<dyn AccountStore>,
}

impl MappingRuleService {
    /// Creates the service over the given stores.
    pub fn new(rules: Arc<dyn MappingRuleStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { rules, accounts }
    }

    /// Validates and stores a new rule.
    pub async fn create(&self, input: MappingRuleInput) -> Result<MappingRule, MappingError> {
        self.validate(&input).await?;

        let now = Utc::now();
        let rule = MappingRule {
            id: MappingRuleId::new(),
            source_type: input.source_type.trim().to_string(),
            description: input.description,
            debit_templates: input.debit_templates,
            credit_templates: input.credit_templates,
            is_active: input.is_active,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        };
        let rule = self.rules.insert(rule).await?;
        info!(rule_id = %rule.id, source_type = %rule.source_type, "Mapping rule created");
        Ok(rule)
    }

    /// Replaces an existing rule's content.
    pub async fn update(
        &self,
        id: MappingRuleId,
        input: MappingRuleInput,
    ) -> Result<MappingRule, MappingError> {
        let existing = self.get(id).await?;
        self.validate(&input).await?;

        let rule = MappingRule {
            source_type: input.source_type.trim().to_string(),
            description: input.description,
            debit_templates: input.debit_templates,
            credit_templates: input.credit_templates,
            is_active: input.is_active,
            priority: input.priority,
            updated_at: Utc::now(),
            ..existing
        };
        let rule = self.rules.update(rule).await?;
        info!(rule_id = %rule.id, source_type = %rule.source_type, "Mapping rule updated");
        Ok(rule)
    }

    /// Deletes a rule.
    pub async fn delete(&self, id: MappingRuleId) -> Result<(), MappingError> {
        self.get(id).await?;
        self.rules.delete(id).await?;
        info!(rule_id = %id, "Mapping rule deleted");
        Ok(())
    }

    /// Marks a rule active.
    pub async fn activate(&self, id: MappingRuleId) -> Result<MappingRule, MappingError> {
        self.set_active(id, true).await
    }

    /// Marks a rule inactive; auto-posting ignores it afterwards.
    pub async fn deactivate(&self, id: MappingRuleId) -> Result<MappingRule, MappingError> {
        self.set_active(id, false).await
    }

    /// Looks up a rule by id.
    pub async fn get(&self, id: MappingRuleId) -> Result<MappingRule, MappingError> {
        self.rules
            .find_by_id(id)
            .await?
            .ok_or(MappingError::NotFound(id))
    }

    /// Looks up a rule by source type regardless of activation.
    pub async fn get_by_source_type(&self, source_type: &str) -> Result<MappingRule, MappingError> {
        self.rules
            .find_by_source_type(source_type)
            .await?
            .ok_or_else(|| MappingError::SourceTypeNotFound(source_type.to_string()))
    }

    /// Lists rules, optionally only active or only inactive ones.
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<MappingRule>, MappingError> {
        Ok(self.rules.list(active).await?)
    }

    /// The rule auto-posting would use for `source_type`, if any.
    pub async fn find_active_by_source_type(
        &self,
        source_type: &str,
    ) -> Result<Option<MappingRule>, MappingError> {
        Ok(self.rules.find_active_by_source_type(source_type).await?)
    }

    /// Applies a stored rule to a sample amount without posting anything.
    pub async fn test(
        &self,
        id: MappingRuleId,
        sample_amount: Decimal,
    ) -> Result<MappingPreview, MappingError> {
        let rule = self.get(id).await?;
        MappingCalculator::preview(&rule, sample_amount)
    }

    async fn set_active(&self, id: MappingRuleId, active: bool) -> Result<MappingRule, MappingError> {
        let rule = MappingRule {
            is_active: active,
            updated_at: Utc::now(),
            ..self.get(id).await?
        };
        let rule = self.rules.update(rule).await?;
        info!(rule_id = %id, active, "Mapping rule activation changed");
        Ok(rule)
    }

    async fn validate(&self, input: &MappingRuleInput) -> Result<(), MappingError> {
        if input.source_type.trim().is_empty() {
            return Err(MappingError::SourceTypeRequired);
        }
        for side in [Side::Debit, Side::Credit] {
            let templates = match side {
                Side::Debit => &input.debit_templates,
                Side::Credit => &input.credit_templates,
            };
            MappingCalculator::validate_side(side, templates)?;
            for template in templates {
                let code = template.account_code.trim();
                let account = self
                    .accounts
                    .find_by_code(code)
                    .await?
                    .ok_or_else(|| AccountError::NotFound(code.to_string()))?;
                account.ensure_postable()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountType};
    use crate::mapping::LineTemplate;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    async fn service() -> MappingRuleService {
        let store = Arc::new(MemoryStore::new());
        let accounts: Arc<dyn AccountStore> = store.clone();
        for account in [
            Account::new("1.1.1", "Kas", AccountType::Asset, false).unwrap(),
            Account::new("1.1.2", "Bank", AccountType::Asset, false).unwrap(),
            Account::new("4.1.1", "Pendapatan Jasa", AccountType::Revenue, false).unwrap(),
            Account::new("4.1", "Pendapatan", AccountType::Revenue, true).unwrap(),
            Account::new("5.1.1", "Beban Lama", AccountType::Expense, false)
                .unwrap()
                .deactivated(),
        ] {
            accounts.upsert(account).await.unwrap();
        }
        MappingRuleService::new(store, accounts)
    }

    fn input(source_type: &str) -> MappingRuleInput {
        MappingRuleInput {
            source_type: source_type.into(),
            description: Some("Pendapatan jasa layanan".into()),
            debit_templates: vec![
                LineTemplate::percentage("1.1.1", "Kas", dec!(60)),
                LineTemplate::percentage("1.1.2", "Bank", dec!(40)),
            ],
            credit_templates: vec![LineTemplate::percentage("4.1.1", "Pendapatan", dec!(100))],
            is_active: true,
            priority: 0,
        }
    }

    #[tokio::test]
    async fn test_create_and_preview() {
        let service = service().await;
        let rule = service.create(input("PENDAPATAN_JASA")).await.unwrap();

        let preview = service.test(rule.id, dec!(1000)).await.unwrap();
        assert_eq!(preview.total_debit, dec!(1000));
        assert_eq!(preview.total_credit, dec!(1000));
        assert!(preview.is_balanced);
        assert_eq!(preview.debit_lines[0].debit, dec!(600));

        assert!(matches!(
            service.test(rule.id, dec!(0)).await,
            Err(MappingError::InvalidSampleAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_source_type_conflicts() {
        let service = service().await;
        service.create(input("PENDAPATAN_JASA")).await.unwrap();
        let err = service.create(input("PENDAPATAN_JASA")).await.unwrap_err();
        assert!(matches!(err, MappingError::DuplicateSourceType(_)));
        assert_eq!(err.http_status_code(), 409);
    }

    #[tokio::test]
    async fn test_fixed_amount_beyond_cents_is_rejected() {
        let service = service().await;
        let mut fixed = input("BIAYA_ADMIN");
        fixed.debit_templates = vec![LineTemplate::fixed("1.1.1", "Kas", dec!(10.005))];
        fixed.credit_templates = vec![LineTemplate::fixed("4.1.1", "Pendapatan", dec!(10.005))];

        let err = service.create(fixed).await.unwrap_err();
        assert!(matches!(err, MappingError::InvalidTemplate { index: 0, .. }));
        assert_eq!(err.error_code(), "INVALID_TEMPLATE");
        assert_eq!(err.http_status_code(), 400);
        assert!(matches!(
            service.get_by_source_type("BIAYA_ADMIN").await,
            Err(MappingError::SourceTypeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_unusable_accounts() {
        let service = service().await;

        let mut header = input("A");
        header.credit_templates = vec![LineTemplate::percentage("4.1", "Pendapatan", dec!(100))];
        assert!(matches!(
            service.create(header).await,
            Err(MappingError::Account(AccountError::HeaderAccount(_)))
        ));

        let mut inactive = input("B");
        inactive.credit_templates = vec![LineTemplate::percentage("5.1.1", "Beban", dec!(100))];
        assert!(matches!(
            service.create(inactive).await,
            Err(MappingError::Account(AccountError::Inactive(_)))
        ));

        let mut missing = input("C");
        missing.credit_templates = vec![LineTemplate::percentage("9.9.9", "X", dec!(100))];
        assert!(matches!(
            service.create(missing).await,
            Err(MappingError::Account(AccountError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_percentages() {
        let service = service().await;
        let mut bad = input("A");
        bad.debit_templates = vec![
            LineTemplate::percentage("1.1.1", "Kas", dec!(60)),
            LineTemplate::percentage("1.1.2", "Bank", dec!(30)),
        ];
        assert!(matches!(
            service.create(bad).await,
            Err(MappingError::PercentageTotal { side: Side::Debit, .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivated_rule_is_not_active_match() {
        let service = service().await;
        let rule = service.create(input("PENDAPATAN_JASA")).await.unwrap();
        assert!(
            service
                .find_active_by_source_type("PENDAPATAN_JASA")
                .await
                .unwrap()
                .is_some()
        );

        service.deactivate(rule.id).await.unwrap();
        assert!(
            service
                .find_active_by_source_type("PENDAPATAN_JASA")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(service.list(Some(false)).await.unwrap().len(), 1);
        assert!(service.list(Some(true)).await.unwrap().is_empty());

        service.activate(rule.id).await.unwrap();
        assert!(service.get_by_source_type("PENDAPATAN_JASA").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service().await;
        let rule = service.create(input("PENDAPATAN_JASA")).await.unwrap();

        let mut changed = input("PENDAPATAN_JASA");
        changed.priority = 5;
        let updated = service.update(rule.id, changed).await.unwrap();
        assert_eq!(updated.priority, 5);
        assert_eq!(updated.created_at, rule.created_at);

        service.delete(rule.id).await.unwrap();
        assert!(matches!(
            service.get(rule.id).await,
            Err(MappingError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(rule.id).await,
            Err(MappingError::NotFound(_))
        ));
    }
}
