use crate::events::ListenerError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    /// The engine reported a transfer this node never started receiving.
    /// The engine state is inconsistent; the simulation step must stop.
    #[error("Protocol violation in {operation}: no message {message_id} from {from} in the incoming buffer of {host}")]
    ProtocolViolation {
        operation: &'static str,
        host: String,
        message_id: String,
        from: String,
    },

    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl RouterError {
    /// Fatal errors mean the caller cannot continue the current step
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouterError::ProtocolViolation { .. })
    }
}

pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violation_is_fatal() {
        let err = RouterError::ProtocolViolation {
            operation: "complete_transfer",
            host: "H1".into(),
            message_id: "MX".into(),
            from: "H9".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("MX"));
        assert!(err.to_string().contains("H9"));

        assert!(!RouterError::NotFound("M1".into()).is_fatal());
    }

    #[test]
    fn test_config_error_converts() {
        let err: RouterError = ConfigError::Invalid("buffer_size must be positive".into()).into();
        assert!(matches!(err, RouterError::Config(ConfigError::Invalid(_))));
        assert!(!err.is_fatal());
    }
}
