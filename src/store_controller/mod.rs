//! # Store Controller
//!
//! Owns the lifecycle of a Store: places the finalizer, provisions the companion
//! namespace, and on deletion removes every dependent Item before letting the Store go.
//!
//! ## Structure
//!
//! - [`state`] - [`StoreState`], the tagged lifecycle state of a fetched Store
//! - [`reconciler`] - [`StoreReconciler`], one handler per state
//! - [`cleanup`] - [`cascade_delete`] of dependent Items
//! - [`error`] - [`StoreReconcileError`] and [`CleanupError`]
//!
//! ## Deletion
//!
//! A delete request on a finalized Store only marks it. The next reconcile sees
//! `Terminating`, runs the cascade, and removes the finalizer; the store actor then
//! erases the Store. If any Item delete fails the finalizer stays and the reconcile
//! is retried with backoff.

pub mod cleanup;
pub mod error;
pub mod reconciler;
pub mod state;

pub use cleanup::cascade_delete;
pub use error::*;
pub use reconciler::*;
pub use state::*;

use crate::config::ControllerConfig;
use crate::framework::{Controller, ObjectKey, ResourceClient};
use crate::model::{Item, Namespace, Store};

/// Builds the Store controller.
///
/// Namespace changes map back to the Store of the same name, so a missing
/// companion namespace is noticed without a Store change.
pub fn controller(
    stores: ResourceClient<Store>,
    namespaces: ResourceClient<Namespace>,
    items: ResourceClient<Item>,
    config: &ControllerConfig,
) -> Controller<StoreReconciler> {
    Controller::new(
        StoreReconciler::new(stores.clone(), namespaces.clone(), items),
        config.max_concurrent_reconciles,
        config.backoff(),
    )
    .owns(stores)
    .watches(namespaces, |namespace: &Namespace| {
        vec![ObjectKey::cluster(namespace.metadata.name.clone())]
    })
}
