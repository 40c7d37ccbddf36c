//! Auto-posting: business transactions in, posted `AUTO` journals out.
//!
//! - `payload` - field normalization of transaction payloads
//! - `engine` - [`AutoPostingEngine`], subscriber of the `transaction.*` topics

pub mod engine;
pub mod error;
pub mod payload;


pub use engine::AutoPostingEngine;
pub use error::AutoPostError;
pub use payload::NormalizedTransaction;
