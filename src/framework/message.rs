//! # Store Messages
//!
//! This module defines the message types exchanged between a `ResourceClient`
//! and its `ResourceActor`, and the change events the actor publishes to watchers.

use crate::framework::error::StoreError;
use crate::framework::meta::ObjectKey;
use crate::framework::resource::Resource;
use tokio::sync::{broadcast, oneshot};

/// Type alias for the one-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Request sent to a store actor.
///
/// # Resource-Oriented Architecture
/// The variants map onto the verbs of a declarative control plane: whole-object
/// reads and writes, a separate status write, a deletion *request* (which may only
/// mark the object while finalizers remain), and a subscription to change events.
///
/// This type is generic over `T: Resource`, so an `Item` request can never be
/// delivered to the `Store` actor.
#[derive(Debug)]
pub enum ResourceRequest<T: Resource> {
    Create {
        object: T,
        respond_to: Response<T>,
    },
    Get {
        key: ObjectKey,
        respond_to: Response<Option<T>>,
    },
    List {
        namespace: Option<String>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        object: T,
        respond_to: Response<T>,
    },
    UpdateStatus {
        object: T,
        respond_to: Response<T>,
    },
    Delete {
        key: ObjectKey,
        respond_to: Response<()>,
    },
    Watch {
        respond_to: Response<broadcast::Receiver<WatchEvent<T>>>,
    },
}

/// A change notification published by a store actor after a successful write.
///
/// `Modified` carries the object before and after the write, so watchers can react
/// to a field that was changed away from a value as well as to the new value.
#[derive(Debug, Clone)]
pub enum WatchEvent<T> {
    Added(T),
    Modified { old: T, new: T },
    Deleted(T),
}

impl<T> WatchEvent<T> {
    /// The current object, followed by the previous one for `Modified`.
    pub fn objects(&self) -> impl Iterator<Item = &T> {
        let (current, previous) = match self {
            WatchEvent::Added(o) | WatchEvent::Deleted(o) => (o, None),
            WatchEvent::Modified { old, new } => (new, Some(old)),
        };
        std::iter::once(current).chain(previous)
    }
}
