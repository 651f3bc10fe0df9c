use crate::message::{Message, MessageId};
use std::collections::HashMap;

/// Last message recorded as delivered at this node, per id
#[derive(Debug, Default)]
pub struct DeliveryLedger {
    delivered: HashMap<MessageId, Message>,
}

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` as delivered under `id`, returning the entry it replaced
    pub fn record(&mut self, id: impl Into<MessageId>, message: Message) -> Option<Message> {
        self.delivered.insert(id.into(), message)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.delivered.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.delivered.get(id)
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MessageId> {
        self.delivered.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(payload: &'static [u8]) -> Message {
        Message::new("M1", "H1".into(), "H2".into(), payload, 0.0)
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut ledger = DeliveryLedger::new();

        assert!(ledger.record("M1", message(b"first")).is_none());
        let replaced = ledger.record("M1", message(b"second"));

        assert!(ledger.contains("M1"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(&replaced.unwrap().payload[..], b"first");
        assert_eq!(&ledger.get("M1").unwrap().payload[..], b"second");
    }

    #[test]
    fn test_unknown_id() {
        let ledger = DeliveryLedger::new();
        assert!(!ledger.contains("M1"));
        assert!(ledger.is_empty());
        assert_eq!(ledger.ids().count(), 0);
    }
}
