use crate::delivery::Delivery;
use crate::events::error::ListenerResult;
use crate::events::types::RouterEvent;
use crate::message::{Message, NodeId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Sink for router events
///
/// Every method defaults to doing nothing, so listeners only implement the
/// events they care about. Returning an error aborts the current
/// notification round and surfaces to the caller of the router operation.
pub trait MessageListener {
    fn name(&self) -> &str {
        "listener"
    }

    fn new_message(&mut self, _message: &Message) -> ListenerResult<()> {
        Ok(())
    }

    fn transfer_started(
        &mut self,
        _message: &Message,
        _from: &NodeId,
        _to: &NodeId,
    ) -> ListenerResult<()> {
        Ok(())
    }

    fn message_transferred(
        &mut self,
        _message: &Message,
        _from: &NodeId,
        _to: &NodeId,
        _delivery: Delivery,
    ) -> ListenerResult<()> {
        Ok(())
    }

    fn transfer_aborted(
        &mut self,
        _message: &Message,
        _from: &NodeId,
        _to: &NodeId,
    ) -> ListenerResult<()> {
        Ok(())
    }

    fn message_deleted(
        &mut self,
        _message: &Message,
        _host: &NodeId,
        _dropped: bool,
    ) -> ListenerResult<()> {
        Ok(())
    }

    fn message_discarded(
        &mut self,
        _message: &Message,
        _from: &NodeId,
        _to: &NodeId,
    ) -> ListenerResult<()> {
        Ok(())
    }

    /// Route an event to the matching method
    fn handle(&mut self, event: &RouterEvent) -> ListenerResult<()> {
        match event {
            RouterEvent::Created { message } => self.new_message(message),
            RouterEvent::TransferStarted { message, from, to } => {
                self.transfer_started(message, from, to)
            }
            RouterEvent::Transferred {
                message,
                from,
                to,
                delivery,
            } => self.message_transferred(message, from, to, *delivery),
            RouterEvent::Aborted {
                message, from, to, ..
            } => self.transfer_aborted(message, from, to),
            RouterEvent::Deleted {
                message,
                host,
                dropped,
            } => self.message_deleted(message, host, *dropped),
            RouterEvent::Discarded { message, from, to } => {
                self.message_discarded(message, from, to)
            }
        }
    }
}

/// Fan-out of router events to registered listeners, in registration order
#[derive(Default)]
pub struct ListenerHub {
    listeners: Vec<Box<dyn MessageListener>>,
    pending: VecDeque<RouterEvent>,
}

impl ListenerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: impl MessageListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Events queued but not yet delivered
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn notify_created(&mut self, message: &Message) {
        self.pending.push_back(RouterEvent::Created {
            message: message.clone(),
        });
    }

    pub fn notify_transfer_started(&mut self, message: &Message, from: &NodeId, to: &NodeId) {
        self.pending.push_back(RouterEvent::TransferStarted {
            message: message.clone(),
            from: from.clone(),
            to: to.clone(),
        });
    }

    pub fn notify_transferred(
        &mut self,
        message: &Message,
        from: &NodeId,
        to: &NodeId,
        delivery: Delivery,
    ) {
        self.pending.push_back(RouterEvent::Transferred {
            message: message.clone(),
            from: from.clone(),
            to: to.clone(),
            delivery,
        });
    }

    pub fn notify_aborted(
        &mut self,
        message: &Message,
        from: &NodeId,
        to: &NodeId,
        bytes_remaining: Option<u64>,
    ) {
        self.pending.push_back(RouterEvent::Aborted {
            message: message.clone(),
            from: from.clone(),
            to: to.clone(),
            bytes_remaining,
        });
    }

    pub fn notify_deleted(&mut self, message: &Message, host: &NodeId, dropped: bool) {
        self.pending.push_back(RouterEvent::Deleted {
            message: message.clone(),
            host: host.clone(),
            dropped,
        });
    }

    pub fn notify_discarded(&mut self, message: &Message, from: &NodeId, to: &NodeId) {
        self.pending.push_back(RouterEvent::Discarded {
            message: message.clone(),
            from: from.clone(),
            to: to.clone(),
        });
    }

    /// Deliver queued events in order. Returns how many events were delivered.
    ///
    /// The first listener error stops the round: the rest of the queue is
    /// discarded and the error is returned.
    pub fn drain(&mut self) -> ListenerResult<usize> {
        let mut delivered = 0;

        while let Some(event) = self.pending.pop_front() {
            for listener in self.listeners.iter_mut() {
                if let Err(e) = listener.handle(&event) {
                    tracing::warn!(
                        "Listener {} failed on {} event for {}: {}",
                        listener.name(),
                        event.kind(),
                        event.message().id,
                        e
                    );
                    self.pending.clear();
                    return Err(e);
                }
            }
            delivered += 1;
        }

        Ok(delivered)
    }
}

/// Listener that records every event, sharing the log through cheap clones
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RouterEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RouterEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl MessageListener for EventLog {
    fn name(&self) -> &str {
        "event-log"
    }

    fn handle(&mut self, event: &RouterEvent) -> ListenerResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
