//! Broadcast relay router
//!
//! Every completed inbound transfer is treated as a local delivery for
//! bookkeeping purposes, and every finalized message is kept in the buffer
//! so the node continues relaying it to future contacts, whatever its
//! declared destination.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod types;

pub use broadcast::BroadcastRouter;
pub use config::{RouterConfig, RouterConfigBuilder};
pub use error::{ConfigError, ConfigResult, RouterError, RouterResult};
pub use types::{Completion, DropPolicy, FinalOutcome, ReceiveCode, RouterStats};
