//! Metrics and observability module
//!
//! Key metrics exposed:
//! - Transfer completions by delivery class
//! - Admission decisions by receive code
//! - Pipeline drops and discards
//! - Aborts, deletions and expiries
//! - Buffer usage per host

pub mod exporter;
pub mod recorder;

pub use exporter::{install_exporter, render_metrics, MetricsError};
pub use recorder::{init_metrics, record_transfer_completed};
