use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Listener {listener} failed: {reason}")]
    Failed { listener: String, reason: String },
}

impl ListenerError {
    pub fn failed(listener: impl Into<String>, reason: impl Into<String>) -> Self {
        ListenerError::Failed {
            listener: listener.into(),
            reason: reason.into(),
        }
    }
}

pub type ListenerResult<T> = Result<T, ListenerError>;
