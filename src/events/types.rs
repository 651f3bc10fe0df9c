use crate::delivery::Delivery;
use crate::message::{Message, NodeId};
use serde::{Deserialize, Serialize};

/// Events emitted by a router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouterEvent {
    /// A message was created on `message.from`
    Created { message: Message },

    /// A contact started pushing a message to `to`
    TransferStarted {
        message: Message,
        from: NodeId,
        to: NodeId,
    },

    /// A transfer finished and the message was finalized at `to`
    Transferred {
        message: Message,
        from: NodeId,
        to: NodeId,
        delivery: Delivery,
    },

    /// A transfer was cut off before completing
    Aborted {
        message: Message,
        from: NodeId,
        to: NodeId,
        bytes_remaining: Option<u64>,
    },

    /// A message left the buffer of `host`
    Deleted {
        message: Message,
        host: NodeId,
        dropped: bool,
    },

    /// A completed transfer was discarded by the application pipeline
    Discarded {
        message: Message,
        from: NodeId,
        to: NodeId,
    },
}

impl RouterEvent {
    pub fn message(&self) -> &Message {
        match self {
            RouterEvent::Created { message }
            | RouterEvent::TransferStarted { message, .. }
            | RouterEvent::Transferred { message, .. }
            | RouterEvent::Aborted { message, .. }
            | RouterEvent::Deleted { message, .. }
            | RouterEvent::Discarded { message, .. } => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RouterEvent::Created { .. } => "created",
            RouterEvent::TransferStarted { .. } => "transfer_started",
            RouterEvent::Transferred { .. } => "transferred",
            RouterEvent::Aborted { .. } => "aborted",
            RouterEvent::Deleted { .. } => "deleted",
            RouterEvent::Discarded { .. } => "discarded",
        }
    }
}
