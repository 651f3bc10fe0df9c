use crate::message::{MessageId, NodeId};
use serde::{Deserialize, Serialize};

/// Staging entries are distinguished by the hop they arrive from
pub type StagingKey = (MessageId, NodeId);

/// What happened when a message was handed to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    /// Stored under a new id
    Stored,
    /// Overwrote a message with the same id
    Replaced,
    /// Capacity policy refused it; the buffer is unchanged
    Rejected,
}

impl Retention {
    pub fn is_retained(&self) -> bool {
        !matches!(self, Retention::Rejected)
    }
}

/// Order in which buffered messages are offered to contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Shuffled with the router's seeded RNG
    #[default]
    Random,
    /// Oldest receive time first
    Fifo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BufferStats {
    pub total_messages: u64,
    pub originated: u64,
    pub used_bytes: u64,
    pub capacity: u64,
}

impl BufferStats {
    /// Get utilization percentage
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.capacity as f64 * 100.0
    }
}

impl std::fmt::Display for BufferStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Buffer: {} messages ({} originated), {}/{} bytes ({:.1}%)",
            self.total_messages,
            self.originated,
            self.used_bytes,
            self.capacity,
            self.utilization()
        )
    }
}
