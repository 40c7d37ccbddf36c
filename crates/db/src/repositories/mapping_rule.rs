//! Mapping rule repository.

use async_trait::async_trait;
use blud_core::mapping::{LineTemplate, MappingRule};
use blud_core::store::{MappingRuleStore, StoreError, StoreResult};
use blud_shared::types::MappingRuleId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{backend, to_tz, to_utc, unique_or_backend};
use crate::entities::mapping_rules;

/// Stores mapping rules with their templates as JSONB.
#[derive(Debug, Clone)]
pub struct MappingRuleRepository {
    db: DatabaseConnection,
}

impl MappingRuleRepository {
    /// Creates a new mapping rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn templates_from(value: serde_json::Value) -> StoreResult<Vec<LineTemplate>> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Backend(format!("Unreadable mapping templates: {e}")))
}

fn templates_to(templates: &[LineTemplate]) -> StoreResult<serde_json::Value> {
    serde_json::to_value(templates)
        .map_err(|e| StoreError::Backend(format!("Unwritable mapping templates: {e}")))
}

fn to_rule(model: mapping_rules::Model) -> StoreResult<MappingRule> {
    Ok(MappingRule {
        id: MappingRuleId(model.id),
        source_type: model.source_type,
        description: model.description,
        debit_templates: templates_from(model.debit_templates)?,
        credit_templates: templates_from(model.credit_templates)?,
        is_active: model.is_active,
        priority: model.priority,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

fn active_model(rule: &MappingRule) -> StoreResult<mapping_rules::ActiveModel> {
    Ok(mapping_rules::ActiveModel {
        id: Set(rule.id.0),
        source_type: Set(rule.source_type.clone()),
        description: Set(rule.description.clone()),
        debit_templates: Set(templates_to(&rule.debit_templates)?),
        credit_templates: Set(templates_to(&rule.credit_templates)?),
        is_active: Set(rule.is_active),
        priority: Set(rule.priority),
        created_at: Set(to_tz(rule.created_at)),
        updated_at: Set(to_tz(rule.updated_at)),
    })
}

#[async_trait]
impl MappingRuleStore for MappingRuleRepository {
    async fn insert(&self, rule: MappingRule) -> StoreResult<MappingRule> {
        let saved = active_model(&rule)?
            .insert(&self.db)
            .await
            .map_err(unique_or_backend("MappingRule", &rule.source_type))?;
        to_rule(saved)
    }

    async fn update(&self, rule: MappingRule) -> StoreResult<MappingRule> {
        if mapping_rules::Entity::find_by_id(rule.id.0)
            .one(&self.db)
            .await
            .map_err(backend)?
            .is_none()
        {
            return Err(StoreError::not_found("MappingRule", rule.id));
        }
        let saved = active_model(&rule)?
            .update(&self.db)
            .await
            .map_err(unique_or_backend("MappingRule", &rule.source_type))?;
        to_rule(saved)
    }

    async fn delete(&self, id: MappingRuleId) -> StoreResult<()> {
        let result = mapping_rules::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("MappingRule", id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: MappingRuleId) -> StoreResult<Option<MappingRule>> {
        mapping_rules::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_rule)
            .transpose()
    }

    async fn find_by_source_type(&self, source_type: &str) -> StoreResult<Option<MappingRule>> {
        mapping_rules::Entity::find()
            .filter(mapping_rules::Column::SourceType.eq(source_type))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_rule)
            .transpose()
    }

    async fn find_active_by_source_type(
        &self,
        source_type: &str,
    ) -> StoreResult<Option<MappingRule>> {
        mapping_rules::Entity::find()
            .filter(mapping_rules::Column::SourceType.eq(source_type))
            .filter(mapping_rules::Column::IsActive.eq(true))
            .order_by_desc(mapping_rules::Column::Priority)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_rule)
            .transpose()
    }

    async fn list(&self, active: Option<bool>) -> StoreResult<Vec<MappingRule>> {
        let mut query = mapping_rules::Entity::find().order_by_asc(mapping_rules::Column::SourceType);
        if let Some(active) = active {
            query = query.filter(mapping_rules::Column::IsActive.eq(active));
        }
        query
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_rule)
            .collect()
    }
}
