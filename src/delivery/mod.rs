//! Local delivery bookkeeping
//!
//! The ledger remembers which message ids this node has treated as
//! delivered. It is a local record, not a network-wide one.

pub mod ledger;
pub mod types;

pub use ledger::DeliveryLedger;
pub use types::{Delivery, DeliveryClass, DeliveryFlagMode};
