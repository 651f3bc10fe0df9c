//! Message event notification
//!
//! Router operations enqueue events while they mutate state; the queue is
//! drained to listeners once the operation's state changes are complete, so
//! a listener never observes (or re-enters) a half-finished transfer.

pub mod error;
pub mod hub;
pub mod types;

pub use error::{ListenerError, ListenerResult};
pub use hub::{EventLog, ListenerHub, MessageListener};
pub use types::RouterEvent;
