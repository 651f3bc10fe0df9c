//! Router configuration

use crate::delivery::DeliveryFlagMode;
use crate::message::NodeId;
use crate::router::error::{ConfigError, ConfigResult};
use crate::router::types::DropPolicy;
use crate::store::QueueMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a broadcast router
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Identity of the host this router runs on
    pub host: NodeId,

    /// Buffer capacity in bytes
    pub buffer_size: u64,

    /// Order in which buffered messages are offered to contacts
    pub queue_mode: QueueMode,

    /// Seed for random queue ordering
    pub rng_seed: u64,

    /// What a pipeline drop means for a completed transfer
    pub drop_policy: DropPolicy,

    /// How the boolean first-delivery flag is computed for listeners
    pub delivery_flag: DeliveryFlagMode,

    /// Record retargeted messages in the delivery ledger
    pub credit_retargeted: bool,

    /// Directory for buffer snapshots (in-memory only when unset)
    pub persistence_path: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            host: NodeId::new(uuid::Uuid::new_v4().to_string()),
            buffer_size: u64::MAX,
            queue_mode: QueueMode::default(),
            rng_seed: 0,
            drop_policy: DropPolicy::default(),
            delivery_flag: DeliveryFlagMode::default(),
            credit_retargeted: true,
            persistence_path: None,
        }
    }
}

impl RouterConfig {
    /// Default configuration for `host`
    pub fn for_host(host: impl Into<NodeId>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON document; omitted fields take their defaults
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.as_str().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for router configuration
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    pub fn new(host: impl Into<NodeId>) -> Self {
        Self {
            config: RouterConfig::for_host(host),
        }
    }

    pub fn buffer_size(mut self, bytes: u64) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    pub fn queue_mode(mut self, mode: QueueMode) -> Self {
        self.config.queue_mode = mode;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = seed;
        self
    }

    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.config.drop_policy = policy;
        self
    }

    pub fn delivery_flag(mut self, mode: DeliveryFlagMode) -> Self {
        self.config.delivery_flag = mode;
        self
    }

    pub fn credit_retargeted(mut self, credit: bool) -> Self {
        self.config.credit_retargeted = credit;
        self
    }

    pub fn persistence_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.persistence_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> ConfigResult<RouterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
