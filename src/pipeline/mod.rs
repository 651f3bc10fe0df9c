//! Per-application transform pipeline
//!
//! Stages registered for an application id run in registration order, each
//! consuming the previous stage's output. Stages registered without an id
//! form the wildcard chain, which runs for every message.

pub mod pipeline;
pub mod types;

pub use pipeline::ApplicationPipeline;
pub use types::{ChainOutcome, StageVerdict, TransformStage};
