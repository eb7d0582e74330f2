//! # Item Controller
//!
//! Keeps `status.copy_count` on every original Item equal to the number of Items,
//! in any namespace, whose `spec.copy_of` names it.
//!
//! ## Structure
//!
//! - [`reconciler`] - [`ItemReconciler`] plus the pure counting and mapping functions
//! - [`error`] - [`ItemReconcileError`]
//!
//! ## Wiring
//!
//! Items are watched twice: under their own key, and through [`copy_of_mapper`] so that
//! a change to a copy also reconciles the original it points at.
//!
//! ```rust,ignore
//! let controller = item_controller::controller(item_client, &config.item_controller);
//! tokio::spawn(controller.run(shutdown));
//! ```

pub mod error;
pub mod reconciler;

pub use error::*;
pub use reconciler::*;

use crate::config::ControllerConfig;
use crate::framework::{Controller, ResourceClient};
use crate::model::Item;

/// Builds the Item controller with both of its watch sources.
pub fn controller(
    items: ResourceClient<Item>,
    config: &ControllerConfig,
) -> Controller<ItemReconciler> {
    Controller::new(
        ItemReconciler::new(items.clone()),
        config.max_concurrent_reconciles,
        config.backoff(),
    )
    .owns(items.clone())
    .watches(items, copy_of_mapper)
}
