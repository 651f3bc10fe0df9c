//! Metrics recorder for router operations

use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "dtn_transfers_received_total",
        "Admission decisions for incoming transfers, by receive code"
    );
    describe_counter!(
        "dtn_transfers_completed_total",
        "Inbound transfers finalized by the completion handler"
    );
    describe_counter!(
        "dtn_deliveries_total",
        "Completed transfers by delivery class"
    );
    describe_counter!(
        "dtn_bytes_received_total",
        "Bytes of finalized inbound transfers"
    );
    describe_counter!(
        "dtn_pipeline_drops_total",
        "Messages dropped by an application stage"
    );
    describe_counter!(
        "dtn_messages_discarded_total",
        "Completed transfers discarded under the discard drop policy"
    );
    describe_counter!(
        "dtn_transfers_aborted_total",
        "Inbound transfers aborted before completion"
    );
    describe_counter!(
        "dtn_messages_created_total",
        "Messages created on a node"
    );
    describe_counter!(
        "dtn_messages_deleted_total",
        "Messages removed from a buffer"
    );
    describe_counter!(
        "dtn_capacity_rejections_total",
        "Retentions refused by buffer capacity"
    );

    describe_gauge!("dtn_buffer_used_bytes", "Current buffer usage in bytes");
    describe_gauge!("dtn_buffer_messages", "Current number of buffered messages");
}

// ============== Transfer Lifecycle ==============

/// Record an admission decision
pub fn record_admission(host: &str, code: &str) {
    counter!("dtn_transfers_received_total", "host" => host.to_string(), "code" => code.to_string())
        .increment(1);
}

/// Record a finalized inbound transfer
pub fn record_transfer_completed(host: &str, class: &str, size: u64) {
    counter!("dtn_transfers_completed_total", "host" => host.to_string()).increment(1);
    counter!("dtn_deliveries_total", "host" => host.to_string(), "class" => class.to_string())
        .increment(1);
    counter!("dtn_bytes_received_total", "host" => host.to_string()).increment(size);
}

/// Record an application stage dropping a message
pub fn record_pipeline_drop(host: &str, app_id: Option<&str>) {
    counter!(
        "dtn_pipeline_drops_total",
        "host" => host.to_string(),
        "app" => app_id.unwrap_or("*").to_string()
    )
    .increment(1);
}

/// Record a completed transfer discarded by policy
pub fn record_discard(host: &str) {
    counter!("dtn_messages_discarded_total", "host" => host.to_string()).increment(1);
}

/// Record an aborted transfer
pub fn record_transfer_aborted(host: &str) {
    counter!("dtn_transfers_aborted_total", "host" => host.to_string()).increment(1);
}

// ============== Buffer Operations ==============

/// Record a message created locally
pub fn record_message_created(host: &str) {
    counter!("dtn_messages_created_total", "host" => host.to_string()).increment(1);
}

/// Record a message leaving the buffer
pub fn record_message_deleted(host: &str, dropped: bool) {
    let reason = if dropped { "dropped" } else { "removed" };
    counter!("dtn_messages_deleted_total", "host" => host.to_string(), "reason" => reason)
        .increment(1);
}

/// Record a retention refused for lack of space
pub fn record_capacity_rejection(host: &str) {
    counter!("dtn_capacity_rejections_total", "host" => host.to_string()).increment(1);
}

/// Update buffer gauges
pub fn set_buffer_usage(host: &str, used_bytes: u64, messages: usize) {
    gauge!("dtn_buffer_used_bytes", "host" => host.to_string()).set(used_bytes as f64);
    gauge!("dtn_buffer_messages", "host" => host.to_string()).set(messages as f64);
}
