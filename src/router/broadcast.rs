//! Broadcast router implementation
//!
//! Finalizes inbound transfers: stamps the arrived message, runs it through
//! the application pipeline, records the delivery, keeps the result for
//! relaying and notifies listeners.

use crate::clock::{Clock, SimClock};
use crate::delivery::{Delivery, DeliveryClass, DeliveryLedger};
use crate::events::{ListenerHub, MessageListener};
use crate::message::{Message, MessageId, NodeId};
use crate::metrics::recorder;
use crate::pipeline::{ApplicationPipeline, ChainOutcome, TransformStage};
use crate::router::config::RouterConfig;
use crate::router::error::{RouterError, RouterResult};
use crate::router::types::{Completion, DropPolicy, FinalOutcome, ReceiveCode, RouterStats};
use crate::store::{InMemoryStore, MessageStore, QueueMode, Retention, StoreError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

/// A DTN router in broadcast relay mode
pub struct BroadcastRouter<S = InMemoryStore, C = SimClock> {
    /// Router configuration
    config: RouterConfig,

    /// Staging area and buffer
    store: S,

    /// Simulation time source
    clock: C,

    /// Application transforms
    pipeline: ApplicationPipeline,

    /// Ids treated as delivered here
    ledger: DeliveryLedger,

    /// Event fan-out
    hub: ListenerHub,

    stats: RouterStats,

    /// Drives random queue ordering
    rng: StdRng,
}

impl<C: Clock> BroadcastRouter<InMemoryStore, C> {
    /// Create a router with an in-memory store sized from `config`
    pub fn new(config: RouterConfig, clock: C) -> RouterResult<Self> {
        config.validate()?;

        let store = match config.persistence_path {
            Some(ref path) => InMemoryStore::persistent(config.buffer_size, path)?,
            None => InMemoryStore::new(config.buffer_size),
        };

        Ok(Self::with_store(config, store, clock))
    }
}

impl<S: MessageStore, C: Clock> BroadcastRouter<S, C> {
    /// Create a router on top of an existing store
    pub fn with_store(config: RouterConfig, store: S, clock: C) -> Self {
        let rng = StdRng::seed_from_u64(config.rng_seed);

        Self {
            config,
            store,
            clock,
            pipeline: ApplicationPipeline::new(),
            ledger: DeliveryLedger::new(),
            hub: ListenerHub::new(),
            stats: RouterStats::default(),
            rng,
        }
    }

    pub fn host(&self) -> &NodeId {
        &self.config.host
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    pub fn pipeline(&self) -> &ApplicationPipeline {
        &self.pipeline
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Append a transform stage for `app_id` (`None` = every message)
    pub fn add_application(&mut self, app_id: Option<&str>, stage: impl TransformStage + 'static) {
        self.pipeline.register(app_id, stage);
    }

    pub fn add_listener(&mut self, listener: impl MessageListener + 'static) {
        self.hub.register(listener);
    }

    /// Admission check for a contact that wants to push `message` from `from`
    ///
    /// On [`ReceiveCode::Accept`] a copy (with this host appended to its path)
    /// is staged until [`Self::complete_transfer`] or [`Self::message_aborted`].
    pub fn receive_message(
        &mut self,
        message: &Message,
        from: &NodeId,
    ) -> RouterResult<ReceiveCode> {
        let now = self.clock.now();

        let code = if self.store.is_staged(&message.id, from) {
            ReceiveCode::RetryLaterBusy
        } else if self.store.contains(&message.id) || self.is_delivered(message) {
            ReceiveCode::DeniedOld
        } else if message.is_expired(now) {
            ReceiveCode::DeniedTtl
        } else if message.size > self.store.capacity() {
            ReceiveCode::DeniedNoSpace
        } else {
            ReceiveCode::Accept
        };

        recorder::record_admission(self.config.host.as_str(), code.as_str());

        if !code.is_accepted() {
            self.stats.transfers_refused += 1;
            debug!(
                "{} refused {} from {}: {}",
                self.config.host,
                message.id,
                from,
                code.as_str()
            );
            return Ok(code);
        }

        let mut staged = message.clone();
        staged.add_hop(&self.config.host);
        self.store.stage(staged, from)?;
        self.stats.transfers_accepted += 1;

        self.hub
            .notify_transfer_started(message, from, &self.config.host);
        self.hub.drain()?;

        Ok(code)
    }

    /// Finalize a completed inbound transfer of `id` from `from`
    ///
    /// Every completion is treated as a delivery to this node: the ledger is
    /// updated and the finalized message is kept in the buffer for further
    /// relaying regardless of its destination. The only exception is a
    /// pipeline drop under [`DropPolicy::Discard`].
    ///
    /// Fails with a fatal [`RouterError::ProtocolViolation`] when no transfer
    /// of `id` from `from` is staged.
    pub fn complete_transfer(&mut self, id: &str, from: &NodeId) -> RouterResult<Completion> {
        let mut incoming = self
            .store
            .release_staged(id, from)
            .ok_or_else(|| self.protocol_violation("complete_transfer", id, from))?;

        let now = self.clock.now();
        incoming.receive_time = now;
        let arrived_to = incoming.to.clone();

        let chain = self.pipeline.run(incoming, &self.config.host);
        let outcome = self.resolve(chain, &arrived_to, now);
        let host = self.config.host.clone();

        let completion = match outcome {
            FinalOutcome::Discard { original } => {
                self.stats.discarded += 1;
                recorder::record_discard(host.as_str());
                info!("{} discarded {} from {}", host, original.id, from);

                self.hub.notify_discarded(&original, from, &host);

                Completion {
                    outcome: FinalOutcome::Discard { original },
                    from: from.clone(),
                    delivery: None,
                    retention: None,
                }
            }
            outcome => {
                let message = outcome.message();
                let retargeted = matches!(outcome, FinalOutcome::Forward(_));

                let class = self.classify(message, retargeted);
                let delivery = Delivery::new(class, self.config.delivery_flag);

                if !retargeted || self.config.credit_retargeted {
                    self.ledger.record(message.id.clone(), message.clone());
                }

                let retention = self.retain(message.clone(), false)?;

                self.stats.transfers_completed += 1;
                self.stats.bytes_received = self.stats.bytes_received.saturating_add(message.size);
                self.stats.record_class(class);
                recorder::record_transfer_completed(host.as_str(), class.as_str(), message.size);

                debug!(
                    "{} completed {} from {} ({}, {:?})",
                    host, message.id, from, class, retention
                );

                self.hub.notify_transferred(message, from, &host, delivery);

                Completion {
                    outcome,
                    from: from.clone(),
                    delivery: Some(delivery),
                    retention: Some(retention),
                }
            }
        };

        self.update_buffer_gauges();
        self.hub.drain()?;

        Ok(completion)
    }

    /// Turn the chain result into the finalized outcome
    fn resolve(&mut self, chain: ChainOutcome, arrived_to: &NodeId, now: f64) -> FinalOutcome {
        match chain {
            ChainOutcome::Survived(mut message) => {
                // Stages may rewrite the message but not when it arrived
                message.receive_time = now;

                if &message.to != arrived_to {
                    FinalOutcome::Forward(message)
                } else {
                    FinalOutcome::Deliver(message)
                }
            }
            ChainOutcome::Dropped { original, stage } => {
                self.stats.pipeline_drops += 1;
                recorder::record_pipeline_drop(
                    self.config.host.as_str(),
                    original.app_id.as_deref(),
                );
                debug!(
                    "{}: stage {} dropped {} ({:?})",
                    self.config.host, stage, original.id, self.config.drop_policy
                );

                match self.config.drop_policy {
                    DropPolicy::FallbackToOriginal => FinalOutcome::Deliver(original),
                    DropPolicy::Discard => FinalOutcome::Discard { original },
                }
            }
        }
    }

    fn classify(&self, message: &Message, retargeted: bool) -> DeliveryClass {
        if retargeted {
            DeliveryClass::RetargetedPassthrough
        } else if self.ledger.contains(&message.id) {
            DeliveryClass::RepeatRelay
        } else {
            DeliveryClass::NewDelivery
        }
    }

    /// Hand a message to the buffer; capacity refusal is a logged no-op
    fn retain(&mut self, message: Message, originated: bool) -> RouterResult<Retention> {
        let id = message.id.clone();

        match self.store.retain(message, originated) {
            Ok(retention) => Ok(retention),
            Err(StoreError::CapacityExceeded { needed, free }) => {
                warn!(
                    "Buffer of {} full, not retaining {} ({} bytes needed, {} free)",
                    self.config.host, id, needed, free
                );
                self.stats.capacity_rejections += 1;
                recorder::record_capacity_rejection(self.config.host.as_str());
                Ok(Retention::Rejected)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The contact delivering `id` from `from` broke before completion
    ///
    /// Consumes the staging entry without running the completion handler.
    pub fn message_aborted(
        &mut self,
        id: &str,
        from: &NodeId,
        bytes_remaining: Option<u64>,
    ) -> RouterResult<Message> {
        let message = self
            .store
            .release_staged(id, from)
            .ok_or_else(|| self.protocol_violation("message_aborted", id, from))?;

        self.stats.transfers_aborted += 1;
        recorder::record_transfer_aborted(self.config.host.as_str());
        debug!(
            "{}: transfer of {} from {} aborted ({:?} bytes remaining)",
            self.config.host, id, from, bytes_remaining
        );

        self.hub
            .notify_aborted(&message, from, &self.config.host, bytes_remaining);
        self.hub.drain()?;

        Ok(message)
    }

    /// Add a message originating at this node
    ///
    /// Returns `false` when the message does not fit the buffer.
    pub fn create_new_message(&mut self, message: Message) -> RouterResult<bool> {
        if message.size > self.store.capacity() {
            warn!(
                "{}: message {} ({} bytes) exceeds the buffer size",
                self.config.host, message.id, message.size
            );
            return Ok(false);
        }

        if !self.retain(message.clone(), true)?.is_retained() {
            return Ok(false);
        }

        self.stats.messages_created += 1;
        recorder::record_message_created(self.config.host.as_str());

        self.hub.notify_created(&message);
        self.update_buffer_gauges();
        self.hub.drain()?;

        Ok(true)
    }

    /// Remove a message from the buffer. `dropped` marks removals forced by policy.
    pub fn delete_message(&mut self, id: &str, dropped: bool) -> RouterResult<Message> {
        let message = self
            .store
            .remove(id)
            .ok_or_else(|| RouterError::NotFound(id.to_string()))?;

        self.stats.messages_deleted += 1;
        recorder::record_message_deleted(self.config.host.as_str(), dropped);

        self.hub.notify_deleted(&message, &self.config.host, dropped);
        self.update_buffer_gauges();
        self.hub.drain()?;

        Ok(message)
    }

    /// Drop buffered messages whose time-to-live has run out
    pub fn drop_expired(&mut self) -> RouterResult<Vec<MessageId>> {
        let now = self.clock.now();
        let expired: Vec<MessageId> = self
            .store
            .messages_fifo()
            .into_iter()
            .filter(|m| m.is_expired(now))
            .map(|m| m.id)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(message) = self.store.remove(&id) {
                self.stats.messages_expired += 1;
                self.stats.messages_deleted += 1;
                recorder::record_message_deleted(self.config.host.as_str(), true);

                self.hub.notify_deleted(&message, &self.config.host, true);
                removed.push(id);
            }
        }

        if !removed.is_empty() {
            info!(
                "{}: dropped {} expired messages at t={}",
                self.config.host,
                removed.len(),
                now
            );
        }

        self.update_buffer_gauges();
        self.hub.drain()?;

        Ok(removed)
    }

    /// True if a message with this id was ever treated as delivered here
    pub fn is_delivered(&self, message: &Message) -> bool {
        self.ledger.contains(&message.id)
    }

    pub fn has_message(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    pub fn get_message(&self, id: &str) -> Option<Message> {
        self.store.get(id)
    }

    /// True if some contact is currently delivering `id` to this node
    pub fn is_incoming(&self, id: &str) -> bool {
        self.store.is_incoming(id)
    }

    pub fn buffer_size(&self) -> u64 {
        self.store.capacity()
    }

    pub fn free_buffer_size(&self) -> u64 {
        self.store.free_bytes()
    }

    pub fn message_count(&self) -> usize {
        self.store.message_count()
    }

    /// Buffered messages in the order they should be offered to a contact
    pub fn messages_by_queue_mode(&mut self) -> Vec<Message> {
        let mut messages = self.store.messages_fifo();

        if self.config.queue_mode == QueueMode::Random {
            messages.shuffle(&mut self.rng);
        }

        messages
    }

    fn protocol_violation(&self, operation: &'static str, id: &str, from: &NodeId) -> RouterError {
        error!(
            "{}: {} for {} from {} with no staged transfer",
            self.config.host, operation, id, from
        );
        RouterError::ProtocolViolation {
            operation,
            host: self.config.host.to_string(),
            message_id: id.to_string(),
            from: from.to_string(),
        }
    }

    fn update_buffer_gauges(&self) {
        recorder::set_buffer_usage(
            self.config.host.as_str(),
            self.store.used_bytes(),
            self.store.message_count(),
        );
    }
}
