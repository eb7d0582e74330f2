//! # Store Errors
//!
//! This module defines the errors a [`ResourceClient`](crate::framework::ResourceClient)
//! can return. Reconcilers and the admission validator classify them: `NotFound`
//! usually means "already converged", `Conflict` means "refetch and recompute",
//! and the rest are surfaced for retry with backoff.

use crate::framework::meta::ObjectKey;

/// Errors that can occur within the resource store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: ObjectKey },
    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: ObjectKey },
    #[error("Conflict on {kind} {key}: expected resource version {expected}, found {actual}")]
    Conflict {
        kind: &'static str,
        key: ObjectKey,
        expected: u64,
        actual: u64,
    },
    #[error("Invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}
