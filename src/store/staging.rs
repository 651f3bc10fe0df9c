//! Staging area for messages that are still arriving
//!
//! An entry is created when a contact starts pushing a message to this node
//! and consumed exactly once, when the transfer completes or is aborted.

use crate::message::{Message, NodeId};
use crate::store::error::{StoreError, StoreResult};
use crate::store::types::StagingKey;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct StagingArea {
    entries: RwLock<HashMap<StagingKey, Message>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start staging `message` as it arrives from `from`
    pub fn stage(&self, message: Message, from: &NodeId) -> StoreResult<()> {
        let key = (message.id.clone(), from.clone());
        let mut entries = self.entries.write();

        if entries.contains_key(&key) {
            return Err(StoreError::AlreadyStaged {
                id: key.0,
                from: from.to_string(),
            });
        }

        entries.insert(key, message);
        Ok(())
    }

    /// Remove and return the entry for (`id`, `from`)
    pub fn release(&self, id: &str, from: &NodeId) -> Option<Message> {
        self.entries.write().remove(&(id.to_string(), from.clone()))
    }

    pub fn contains(&self, id: &str, from: &NodeId) -> bool {
        self.entries
            .read()
            .contains_key(&(id.to_string(), from.clone()))
    }

    /// True if any hop is currently delivering a message with this id
    pub fn is_incoming(&self, id: &str) -> bool {
        self.entries.read().keys().any(|(staged, _)| staged == id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
