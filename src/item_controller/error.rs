//! Error types for the Item reconciler.

use crate::framework::{ObjectKey, StoreError};
use thiserror::Error;

/// Errors that can occur while reconciling an Item.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemReconcileError {
    /// The Item itself could not be read.
    #[error("Failed to fetch Item {key}: {source}")]
    Fetch { key: ObjectKey, source: StoreError },

    /// Listing Items to count copies failed.
    #[error("Failed to list Items: {0}")]
    List(StoreError),

    /// Writing the recomputed copy count failed.
    #[error("Failed to update status of Item {key}: {source}")]
    StatusUpdate { key: ObjectKey, source: StoreError },
}

impl ItemReconcileError {
    /// Whether the failure was a stale `resource_version`.
    pub fn is_conflict(&self) -> bool {
        match self {
            ItemReconcileError::Fetch { source, .. }
            | ItemReconcileError::List(source)
            | ItemReconcileError::StatusUpdate { source, .. } => source.is_conflict(),
        }
    }
}
