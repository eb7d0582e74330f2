//! Errors returned to callers of the typed clients.

use crate::framework::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// Admission denied the write. The message is meant for the caller as is.
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    /// The admission message, if the write was rejected.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            ClientError::Rejected(message) => Some(message),
            ClientError::Store(_) => None,
        }
    }
}
