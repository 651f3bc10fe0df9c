use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique message identifier
pub type MessageId = String;

/// Identity of a node (host) in the network
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A message in transit through the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: MessageId,

    /// Application this message belongs to (if any)
    pub app_id: Option<String>,

    /// Node that created the message
    pub from: NodeId,

    /// Declared destination
    pub to: NodeId,

    /// Message body
    pub payload: Bytes,

    /// Size used for buffer accounting, in bytes
    pub size: u64,

    /// Initial time-to-live in minutes (`None` = never expires)
    pub ttl_minutes: Option<u32>,

    /// Simulation time of creation, in seconds
    pub created_at: f64,

    /// Simulation time the last hop finished delivering it, in seconds
    pub receive_time: f64,

    /// Nodes the message has visited, source first
    pub path: Vec<NodeId>,
}

impl Message {
    /// Create a new message. Size defaults to the payload length.
    pub fn new(
        id: impl Into<MessageId>,
        from: NodeId,
        to: NodeId,
        payload: impl Into<Bytes>,
        created_at: f64,
    ) -> Self {
        let payload = payload.into();
        Self {
            id: id.into(),
            app_id: None,
            path: vec![from.clone()],
            from,
            to,
            size: payload.len() as u64,
            payload,
            ttl_minutes: None,
            created_at,
            receive_time: created_at,
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_ttl(mut self, minutes: u32) -> Self {
        self.ttl_minutes = Some(minutes);
        self
    }

    /// Override the accounted size (simulated messages often carry no real body)
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Replace the payload, keeping the accounted size in step with it
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self.size = self.payload.len() as u64;
        self
    }

    /// Point the message at a different destination
    pub fn retarget(mut self, to: NodeId) -> Self {
        self.to = to;
        self
    }

    /// Remaining time-to-live in minutes at `now`
    pub fn remaining_ttl(&self, now: f64) -> Option<f64> {
        self.ttl_minutes
            .map(|ttl| f64::from(ttl) - (now - self.created_at) / 60.0)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.remaining_ttl(now).map(|ttl| ttl <= 0.0).unwrap_or(false)
    }

    /// The node that handed this message to its current holder
    pub fn previous_hop(&self) -> Option<&NodeId> {
        let len = self.path.len();
        if len < 2 {
            return None;
        }
        self.path.get(len - 2)
    }

    /// Record that the message reached `node`
    pub fn add_hop(&mut self, node: &NodeId) {
        self.path.push(node.clone());
    }

    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}
