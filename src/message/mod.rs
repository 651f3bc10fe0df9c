//! Messages carried between DTN nodes
//!
//! A message is owned by exactly one store at a time: the staging area while
//! it is arriving, the transform pipeline while it is being handled, and the
//! buffer once it is retained for relaying.

pub mod types;

pub use types::{Message, MessageId, NodeId};
