//! Lifecycle state of a Store, derived from the fetched object.

use crate::model::{Store, STORE_FINALIZER};

/// Where a Store is in its finalizer-gated lifecycle.
///
/// ```text
///   Gone            not found
///   PendingFinalizer --add finalizer--> Active --delete--> Terminating --cleanup--> Released
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum StoreState {
    Gone,
    /// Live, finalizer not yet placed.
    PendingFinalizer(Store),
    /// Live and finalized; the companion namespace is maintained.
    Active(Store),
    /// Deletion requested while our finalizer is present. Cleanup must run.
    Terminating(Store),
    /// Deletion requested and our finalizer is already gone.
    Released(Store),
}

impl StoreState {
    pub fn classify(store: Option<Store>) -> Self {
        let Some(store) = store else {
            return StoreState::Gone;
        };
        let finalized = store.metadata.has_finalizer(STORE_FINALIZER);
        match (store.metadata.is_deletion_requested(), finalized) {
            (false, false) => StoreState::PendingFinalizer(store),
            (false, true) => StoreState::Active(store),
            (true, true) => StoreState::Terminating(store),
            (true, false) => StoreState::Released(store),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreState::Gone => "Gone",
            StoreState::PendingFinalizer(_) => "PendingFinalizer",
            StoreState::Active(_) => "Active",
            StoreState::Terminating(_) => "Terminating",
            StoreState::Released(_) => "Released",
        }
    }
}
