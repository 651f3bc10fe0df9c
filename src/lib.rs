//! DTN broadcast router
//!
//! Transfer-completion core of a delay-tolerant-network router running in
//! broadcast mode: messages arrive over intermittent contacts, are staged
//! while arriving, run through per-application transforms once complete,
//! and are then recorded as delivered and kept for relaying onward.
//!
//! The main entry point is [`router::BroadcastRouter`].

pub mod clock;
pub mod delivery;
pub mod events;
pub mod message;
pub mod metrics;
pub mod pipeline;
pub mod router;
pub mod store;

pub use clock::{Clock, SimClock};
pub use delivery::{Delivery, DeliveryClass, DeliveryFlagMode, DeliveryLedger};
pub use events::{EventLog, ListenerError, MessageListener, RouterEvent};
pub use message::{Message, MessageId, NodeId};
pub use pipeline::{StageVerdict, TransformStage};
pub use router::{
    BroadcastRouter, Completion, DropPolicy, FinalOutcome, ReceiveCode, RouterConfig,
    RouterConfigBuilder, RouterError, RouterResult,
};
pub use store::{InMemoryStore, MessageStore, QueueMode, Retention};
