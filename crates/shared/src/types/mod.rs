//! Common types used across the ledger.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{
    AMOUNT_SCALE, BALANCE_TOLERANCE, exceeds_amount_scale, percentage_change, percentage_of,
    round_amount, within_tolerance,
};
pub use pagination::{PageMeta, PageRequest, PageResponse};
