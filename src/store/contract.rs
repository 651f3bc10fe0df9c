//! The storage contract the router depends on

use crate::message::{Message, NodeId};
use crate::store::buffer::{MessageBuffer, MessageBufferBuilder};
use crate::store::error::StoreResult;
use crate::store::staging::StagingArea;
use crate::store::types::{BufferStats, Retention};
use std::path::Path;

/// Staging and buffer operations consumed by the router
pub trait MessageStore {
    /// Begin staging an incoming message from `from`
    fn stage(&self, message: Message, from: &NodeId) -> StoreResult<()>;

    fn is_staged(&self, id: &str, from: &NodeId) -> bool;

    /// True if any hop is currently delivering `id`
    fn is_incoming(&self, id: &str) -> bool;

    /// Remove-and-return the staging entry for (`id`, `from`)
    fn release_staged(&self, id: &str, from: &NodeId) -> Option<Message>;

    /// Store or overwrite a message by id. `originated` marks messages created on this node.
    fn retain(&self, message: Message, originated: bool) -> StoreResult<Retention>;

    fn get(&self, id: &str) -> Option<Message>;

    fn contains(&self, id: &str) -> bool;

    fn remove(&self, id: &str) -> Option<Message>;

    /// Buffered messages, in no particular order
    fn messages(&self) -> Vec<Message>;

    /// Buffered messages, oldest receive time first
    fn messages_fifo(&self) -> Vec<Message>;

    fn capacity(&self) -> u64;

    fn used_bytes(&self) -> u64;

    fn free_bytes(&self) -> u64 {
        self.capacity().saturating_sub(self.used_bytes())
    }

    fn message_count(&self) -> usize {
        self.messages().len()
    }
}

/// Staging area and buffer held in memory
pub struct InMemoryStore {
    staging: StagingArea,
    buffer: MessageBuffer,
}

impl InMemoryStore {
    pub fn new(capacity: u64) -> Self {
        Self::from_buffer(MessageBuffer::new(capacity))
    }

    /// Buffer snapshots live under `path`
    pub fn persistent(capacity: u64, path: impl AsRef<Path>) -> StoreResult<Self> {
        let buffer = MessageBufferBuilder::new()
            .capacity(capacity)
            .persistence_path(path)
            .build()?;
        Ok(Self::from_buffer(buffer))
    }

    pub fn from_buffer(buffer: MessageBuffer) -> Self {
        Self {
            staging: StagingArea::new(),
            buffer,
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> BufferStats {
        self.buffer.stats()
    }
}

impl MessageStore for InMemoryStore {
    fn stage(&self, message: Message, from: &NodeId) -> StoreResult<()> {
        self.staging.stage(message, from)
    }

    fn is_staged(&self, id: &str, from: &NodeId) -> bool {
        self.staging.contains(id, from)
    }

    fn is_incoming(&self, id: &str) -> bool {
        self.staging.is_incoming(id)
    }

    fn release_staged(&self, id: &str, from: &NodeId) -> Option<Message> {
        self.staging.release(id, from)
    }

    fn retain(&self, message: Message, originated: bool) -> StoreResult<Retention> {
        self.buffer.retain(message, originated)
    }

    fn get(&self, id: &str) -> Option<Message> {
        self.buffer.get(id)
    }

    fn contains(&self, id: &str) -> bool {
        self.buffer.contains(id)
    }

    fn remove(&self, id: &str) -> Option<Message> {
        self.buffer.remove(id)
    }

    fn messages(&self) -> Vec<Message> {
        self.buffer.messages()
    }

    fn messages_fifo(&self) -> Vec<Message> {
        self.buffer.in_fifo_order()
    }

    fn capacity(&self) -> u64 {
        self.buffer.capacity()
    }

    fn used_bytes(&self) -> u64 {
        self.buffer.used_bytes()
    }

    fn message_count(&self) -> usize {
        self.buffer.len()
    }
}
