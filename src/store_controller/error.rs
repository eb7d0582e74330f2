//! Error types for the Store reconciler and its cascade delete.

use crate::framework::{ObjectKey, StoreError};
use thiserror::Error;

/// A dependent Item could not be removed. The Store keeps its finalizer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CleanupError {
    #[error("Failed to list Items for cleanup of namespace {namespace}: {source}")]
    List { namespace: String, source: StoreError },

    #[error("Failed to delete Item {key}: {source}")]
    Delete { key: ObjectKey, source: StoreError },
}

/// Errors that can occur while reconciling a Store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreReconcileError {
    #[error("Failed to fetch Store {key}: {source}")]
    Fetch { key: ObjectKey, source: StoreError },

    #[error("Failed to persist finalizer on Store {key}: {source}")]
    AddFinalizer { key: ObjectKey, source: StoreError },

    #[error("Failed to ensure namespace {name}: {source}")]
    Namespace { name: String, source: StoreError },

    #[error("Failed to record namespace owner on Store {key}: {source}")]
    OwnerReference { key: ObjectKey, source: StoreError },

    #[error("Cleanup for Store {key} failed: {source}")]
    Cleanup { key: ObjectKey, source: CleanupError },

    #[error("Failed to remove finalizer from Store {key}: {source}")]
    RemoveFinalizer { key: ObjectKey, source: StoreError },
}

impl StoreReconcileError {
    /// Whether the failure was a stale `resource_version`.
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreReconcileError::Fetch { source, .. }
            | StoreReconcileError::AddFinalizer { source, .. }
            | StoreReconcileError::Namespace { source, .. }
            | StoreReconcileError::OwnerReference { source, .. }
            | StoreReconcileError::RemoveFinalizer { source, .. } => source.is_conflict(),
            StoreReconcileError::Cleanup { .. } => false,
        }
    }
}
