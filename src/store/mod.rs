//! Message storage stand-ins
//!
//! The router only talks to storage through [`MessageStore`]. The in-memory
//! implementation keeps two tables:
//! - the staging area, holding messages that are still arriving, keyed by
//!   (message id, previous hop)
//! - the message buffer, holding messages retained for relaying, keyed by id

pub mod buffer;
pub mod contract;
pub mod error;
pub mod staging;
pub mod types;

pub use buffer::{MessageBuffer, MessageBufferBuilder, StoredMessage};
pub use contract::{InMemoryStore, MessageStore};
pub use error::{StoreError, StoreResult};
pub use staging::StagingArea;
pub use types::{BufferStats, QueueMode, Retention, StagingKey};
