//! Mapping rules: declarative templates that turn a business transaction
//! into balanced journal lines.
//!
//! - `types` - rule, template and preview types
//! - `condition` - template condition evaluation
//! - `calculator` - pure validation and line computation
//! - `service` - rule administration over a [`crate::store::MappingRuleStore`]

pub mod calculator;
pub mod condition;
pub mod error;
pub mod service;
pub mod types;

pub use calculator::{MappingCalculator, PERCENTAGE_TOLERANCE};
pub use error::MappingError;
pub use service::MappingRuleService;
pub use types::{
    AmountBasis, ComputedLine, Condition, ConditionOperator, LineTemplate, MappingPreview,
    MappingRule, MappingRuleInput, Side,
};
