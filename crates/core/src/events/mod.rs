//! Event bus connecting business modules, the journal ledger, auto-posting
//! and the general ledger.

pub mod bus;
pub mod types;

pub use bus::{EventBus, HandlerError, NoopPublisher, Publisher, Subscriber};
pub use types::{DomainEvent, Topic};
