//! Router types

use crate::delivery::{Delivery, DeliveryClass};
use crate::message::{Message, NodeId};
use crate::store::Retention;
use serde::{Deserialize, Serialize};

/// What a pipeline drop means for a completed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Finalize the original arrived message as if no stage had run
    #[default]
    FallbackToOriginal,
    /// Drop the message: no ledger entry, no retention
    Discard,
}

/// Resolved result of handling one completed transfer
#[derive(Debug, Clone, PartialEq)]
pub enum FinalOutcome {
    /// Delivered here and kept for relaying
    Deliver(Message),
    /// Retargeted by the pipeline and kept for relaying
    Forward(Message),
    /// Dropped by the pipeline under [`DropPolicy::Discard`]
    Discard { original: Message },
}

impl FinalOutcome {
    pub fn message(&self) -> &Message {
        match self {
            FinalOutcome::Deliver(message)
            | FinalOutcome::Forward(message)
            | FinalOutcome::Discard { original: message } => message,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            FinalOutcome::Deliver(message)
            | FinalOutcome::Forward(message)
            | FinalOutcome::Discard { original: message } => message,
        }
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, FinalOutcome::Discard { .. })
    }
}

/// Everything the engine learns from one completed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub outcome: FinalOutcome,

    /// Previous hop the message arrived from
    pub from: NodeId,

    /// Delivery indication given to listeners (`None` when discarded)
    pub delivery: Option<Delivery>,

    /// Buffer result (`None` when discarded)
    pub retention: Option<Retention>,
}

impl Completion {
    /// The finalized message (the original arrived message when discarded)
    pub fn message(&self) -> &Message {
        self.outcome.message()
    }

    pub fn into_message(self) -> Message {
        self.outcome.into_message()
    }

    pub fn class(&self) -> Option<DeliveryClass> {
        self.delivery.map(|d| d.class)
    }
}

/// Admission decision for an incoming transfer
///
/// Zero accepts, negative values reject for good, positive values ask the
/// sender to retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiveCode {
    Accept,
    /// Already buffered or already delivered here
    DeniedOld,
    /// Time-to-live ran out
    DeniedTtl,
    /// Larger than the whole buffer
    DeniedNoSpace,
    /// The same hop is already delivering this message
    RetryLaterBusy,
}

impl ReceiveCode {
    pub fn code(&self) -> i32 {
        match self {
            ReceiveCode::Accept => 0,
            ReceiveCode::DeniedOld => -1,
            ReceiveCode::DeniedTtl => -2,
            ReceiveCode::DeniedNoSpace => -3,
            ReceiveCode::RetryLaterBusy => 1,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.code() == 0
    }

    pub fn is_stale(&self) -> bool {
        self.code() < 0
    }

    pub fn should_retry(&self) -> bool {
        self.code() > 0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveCode::Accept => "accept",
            ReceiveCode::DeniedOld => "denied_old",
            ReceiveCode::DeniedTtl => "denied_ttl",
            ReceiveCode::DeniedNoSpace => "denied_no_space",
            ReceiveCode::RetryLaterBusy => "retry_later_busy",
        }
    }
}

/// Statistics for a router
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterStats {
    /// Transfers admitted into staging
    pub transfers_accepted: u64,

    /// Transfers refused or deferred at admission
    pub transfers_refused: u64,

    /// Transfers finalized by the completion handler
    pub transfers_completed: u64,

    pub new_deliveries: u64,
    pub repeat_relays: u64,
    pub retargeted: u64,

    /// Stage drops (whatever the drop policy made of them)
    pub pipeline_drops: u64,

    /// Completed transfers discarded under [`DropPolicy::Discard`]
    pub discarded: u64,

    pub transfers_aborted: u64,

    /// Retentions refused by buffer capacity
    pub capacity_rejections: u64,

    pub messages_created: u64,
    pub messages_deleted: u64,
    pub messages_expired: u64,

    pub bytes_received: u64,
}

impl RouterStats {
    pub(crate) fn record_class(&mut self, class: DeliveryClass) {
        match class {
            DeliveryClass::NewDelivery => self.new_deliveries += 1,
            DeliveryClass::RepeatRelay => self.repeat_relays += 1,
            DeliveryClass::RetargetedPassthrough => self.retargeted += 1,
        }
    }

    /// Share of completed transfers that were first deliveries
    pub fn new_delivery_rate(&self) -> f64 {
        if self.transfers_completed == 0 {
            return 0.0;
        }
        self.new_deliveries as f64 / self.transfers_completed as f64 * 100.0
    }
}

impl std::fmt::Display for RouterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Router: {} completed ({} new, {} repeat, {} retargeted, {:.1}% new), {} dropped by apps, {} aborted, {} deleted",
            self.transfers_completed,
            self.new_deliveries,
            self.repeat_relays,
            self.retargeted,
            self.new_delivery_rate(),
            self.pipeline_drops,
            self.transfers_aborted,
            self.messages_deleted
        )
    }
}
