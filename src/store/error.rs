use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Buffer capacity exceeded (needed {needed} bytes, {free} free)")]
    CapacityExceeded { needed: u64, free: u64 },

    #[error("Message already staged: {id} from {from}")]
    AlreadyStaged { id: String, from: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
