//! Message buffer for store-and-forward relaying
//!
//! Holds messages this node keeps carrying to future contacts, with byte
//! accounting against a fixed capacity and optional on-disk snapshots.

use crate::message::{Message, MessageId};
use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{BufferStats, Retention};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A message held in the buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message: Message,

    /// Created on this node rather than received from a contact
    pub originated: bool,

    /// Insertion sequence, used to break receive-time ties
    pub seq: u64,
}

/// Buffer of messages retained for relaying
pub struct MessageBuffer {
    /// Messages by id
    messages: RwLock<HashMap<MessageId, StoredMessage>>,

    /// Bytes currently accounted to stored messages
    used_bytes: RwLock<u64>,

    /// Next insertion sequence number
    next_seq: AtomicU64,

    /// Maximum capacity in bytes
    capacity: u64,

    /// Optional snapshot directory
    persistence_path: Option<PathBuf>,
}

impl MessageBuffer {
    /// Create a new in-memory buffer
    pub fn new(capacity: u64) -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
            used_bytes: RwLock::new(0),
            next_seq: AtomicU64::new(0),
            capacity,
            persistence_path: None,
        }
    }

    /// Snapshot every retained message under `path` and reload what is already there
    pub fn with_persistence(mut self, path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        self.persistence_path = Some(path);
        self.load_persisted()?;
        Ok(self)
    }

    /// Store or overwrite a message by id. Snapshot failures are logged, not returned.
    pub fn retain(&self, message: Message, originated: bool) -> StoreResult<Retention> {
        let id = message.id.clone();
        let stored = StoredMessage {
            message,
            originated,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        let retention = self.insert(stored)?;

        // Snapshots are best effort, like removal
        if let Err(e) = self.persist_message(&id) {
            tracing::warn!("Failed to snapshot message {}: {}", id, e);
        }

        Ok(retention)
    }

    fn insert(&self, stored: StoredMessage) -> StoreResult<Retention> {
        let size = stored.message.size;

        let mut messages = self.messages.write();
        let mut used = self.used_bytes.write();

        let replaced = messages
            .get(&stored.message.id)
            .map(|existing| existing.message.size)
            .unwrap_or(0);
        let free = self.capacity.saturating_sub(used.saturating_sub(replaced));
        if size > free {
            return Err(StoreError::CapacityExceeded {
                needed: size,
                free,
            });
        }

        let previous = messages.insert(stored.message.id.clone(), stored);
        *used = used.saturating_sub(replaced) + size;

        Ok(match previous {
            Some(_) => Retention::Replaced,
            None => Retention::Stored,
        })
    }

    /// Get a message by id
    pub fn get(&self, id: &str) -> Option<Message> {
        self.messages.read().get(id).map(|s| s.message.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.read().contains_key(id)
    }

    /// Remove a message and release its bytes
    pub fn remove(&self, id: &str) -> Option<Message> {
        let mut messages = self.messages.write();
        let mut used = self.used_bytes.write();

        let stored = messages.remove(id)?;
        *used = used.saturating_sub(stored.message.size);
        self.remove_persisted(id);

        Some(stored.message)
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Snapshot of all buffered messages, in no particular order
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .values()
            .map(|s| s.message.clone())
            .collect()
    }

    /// Buffered messages ordered by receive time, oldest first
    pub fn in_fifo_order(&self) -> Vec<Message> {
        let messages = self.messages.read();
        let mut stored: Vec<&StoredMessage> = messages.values().collect();
        stored.sort_by(|a, b| {
            a.message
                .receive_time
                .total_cmp(&b.message.receive_time)
                .then(a.seq.cmp(&b.seq))
        });
        stored.into_iter().map(|s| s.message.clone()).collect()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn used_bytes(&self) -> u64 {
        *self.used_bytes.read()
    }

    pub fn free_bytes(&self) -> u64 {
        self.capacity.saturating_sub(self.used_bytes())
    }

    pub fn stats(&self) -> BufferStats {
        let messages = self.messages.read();

        BufferStats {
            total_messages: messages.len() as u64,
            originated: messages.values().filter(|s| s.originated).count() as u64,
            used_bytes: *self.used_bytes.read(),
            capacity: self.capacity,
        }
    }

    fn file_for(path: &Path, id: &str) -> PathBuf {
        let name: String = id.bytes().map(|b| format!("{:02x}", b)).collect();
        path.join(format!("{}.msg", name))
    }

    fn persist_message(&self, id: &str) -> StoreResult<()> {
        if let Some(ref path) = self.persistence_path {
            if let Some(stored) = self.messages.read().get(id) {
                let data = bincode::serialize(stored)?;
                std::fs::write(Self::file_for(path, id), data)?;
            }
        }
        Ok(())
    }

    fn remove_persisted(&self, id: &str) {
        if let Some(ref path) = self.persistence_path {
            let _ = std::fs::remove_file(Self::file_for(path, id));
        }
    }

    /// Load snapshots on startup; files that fail to decode are skipped
    fn load_persisted(&self) -> StoreResult<()> {
        if let Some(ref path) = self.persistence_path {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();

                if file_path.extension().map(|e| e == "msg").unwrap_or(false) {
                    let Ok(data) = std::fs::read(&file_path) else {
                        continue;
                    };
                    match bincode::deserialize::<StoredMessage>(&data) {
                        Ok(stored) => {
                            self.next_seq.fetch_max(stored.seq + 1, Ordering::Relaxed);
                            if let Err(e) = self.insert(stored) {
                                tracing::warn!("Skipping persisted message {:?}: {}", file_path, e);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Undecodable message snapshot {:?}: {}", file_path, e);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Builder for message buffers
pub struct MessageBufferBuilder {
    capacity: u64,
    persistence_path: Option<PathBuf>,
}

impl MessageBufferBuilder {
    pub fn new() -> Self {
        Self {
            capacity: u64::MAX,
            persistence_path: None,
        }
    }

    pub fn capacity(mut self, bytes: u64) -> Self {
        self.capacity = bytes;
        self
    }

    pub fn persistence_path(mut self, path: impl AsRef<Path>) -> Self {
        self.persistence_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> StoreResult<MessageBuffer> {
        let buffer = MessageBuffer::new(self.capacity);

        if let Some(path) = self.persistence_path {
            buffer.with_persistence(path)
        } else {
            Ok(buffer)
        }
    }
}

impl Default for MessageBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
