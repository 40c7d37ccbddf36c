//! Accounting period handling.

pub mod period;

pub use period::{Period, PeriodParseError};
