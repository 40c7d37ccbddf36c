//! Shared types, errors, and configuration for the BLUD ledger.
//!
//! This crate provides common types used across all other crates:
//! - Monetary amount helpers with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LogFormat, StorageBackend};
pub use error::{AppError, AppResult};
