//! # Resource Trait
//!
//! The `Resource` trait is the contract every kind (Item, Store, Namespace) implements
//! to be held by the generic [`ResourceActor`](crate::framework::ResourceActor).
//!
//! # Architecture Note
//! The actor only ever touches objects through this trait: it reads and stamps
//! [`ObjectMeta`], and it moves the status sub-object around so that `update` and
//! `update_status` write disjoint parts of an object. Everything else about a kind
//! (its spec, its invariants) stays in the kind's own module.

use crate::framework::meta::{ObjectKey, ObjectMeta};
use std::fmt::Debug;

/// Trait that any resource kind must implement to be stored by `ResourceActor`.
pub trait Resource: Clone + Debug + Send + Sync + 'static {
    /// Kind name used in logs and owner references (e.g. `"Item"`).
    const KIND: &'static str;

    /// Whether objects of this kind live inside a namespace.
    const NAMESPACED: bool;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Copy the status sub-object of `other` into `self`.
    ///
    /// Kinds without a meaningful status keep the default no-op.
    fn copy_status_from(&mut self, _other: &Self) {}

    fn key(&self) -> ObjectKey {
        self.meta().key()
    }
}
