//! # Store Actor
//!
//! This module defines the `ResourceActor`, the authoritative in-memory store for one
//! resource kind. It implements the "Server" side of the Actor Model: requests are
//! processed sequentially, so the map of objects needs no locking, and every write
//! is a compare-and-update against the version the caller last saw.

use crate::framework::client::ResourceClient;
use crate::framework::error::StoreError;
use crate::framework::message::{ResourceRequest, WatchEvent};
use crate::framework::meta::ObjectKey;
use crate::framework::resource::Resource;
use std::collections::BTreeMap;
use std::time::SystemTime;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// The generic actor that owns every object of kind `T`.
///
/// # Architecture Note
/// This struct is the "Server" half of the store. It owns the objects and the
/// receiver end of the request channel; [`ResourceClient`] is the cloneable "Client"
/// half. Each kind gets its own actor, so Item traffic never queues behind Store traffic.
///
/// ## Write semantics
///
/// * **Create**: rejects duplicate keys, assigns `uid` and `resource_version`, publishes `Added`.
/// * **Update**: requires the caller's `resource_version` to match, replaces spec and
///   metadata but keeps `uid`, status and `deletion_timestamp`. If deletion was requested
///   and the update leaves no finalizers, the object is erased and `Deleted` is published.
/// * **UpdateStatus**: same version check, replaces only the status.
/// * **Delete**: erases immediately when there are no finalizers; otherwise only stamps
///   `deletion_timestamp` (once) and leaves the erase to whoever removes the last finalizer.
pub struct ResourceActor<T: Resource> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<ObjectKey, T>,
    events: broadcast::Sender<WatchEvent<T>>,
    next_uid: u64,
    resource_version: u64,
}

impl<T: Resource> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel. When full, client calls wait.
    /// * `watch_capacity` - Capacity of the change-event broadcast. Watchers that fall
    ///   further behind observe a lag and must relist.
    pub fn new(buffer_size: usize, watch_capacity: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (events, _) = broadcast::channel(watch_capacity.max(1));
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            events,
            next_uid: 0,
            resource_version: 0,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        let kind = T::KIND;
        info!(kind, "Store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { object, respond_to } => {
                    debug!(kind, ?object, "Create");
                    let _ = respond_to.send(self.create(object));
                }
                ResourceRequest::Get { key, respond_to } => {
                    let item = self.store.get(&key).cloned();
                    debug!(kind, %key, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List {
                    namespace,
                    respond_to,
                } => {
                    let items: Vec<T> = self
                        .store
                        .values()
                        .filter(|o| namespace.as_ref().is_none_or(|ns| &o.meta().namespace == ns))
                        .cloned()
                        .collect();
                    debug!(kind, ?namespace, count = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { object, respond_to } => {
                    debug!(kind, ?object, "Update");
                    let _ = respond_to.send(self.update(object));
                }
                ResourceRequest::UpdateStatus { object, respond_to } => {
                    debug!(kind, ?object, "UpdateStatus");
                    let _ = respond_to.send(self.update_status(object));
                }
                ResourceRequest::Delete { key, respond_to } => {
                    debug!(kind, %key, "Delete");
                    let _ = respond_to.send(self.delete(key));
                }
                ResourceRequest::Watch { respond_to } => {
                    debug!(kind, watchers = self.events.receiver_count() + 1, "Watch");
                    let _ = respond_to.send(Ok(self.events.subscribe()));
                }
            }
        }

        info!(kind, size = self.store.len(), "Shutdown");
    }

    fn create(&mut self, mut object: T) -> Result<T, StoreError> {
        let kind = T::KIND;
        let key = object.key();
        if let Err(e) = validate_key::<T>(&key) {
            warn!(kind, %key, error = %e, "Create rejected");
            return Err(e);
        }
        if self.store.contains_key(&key) {
            warn!(kind, %key, "Already exists");
            return Err(StoreError::AlreadyExists { kind, key });
        }

        self.next_uid += 1;
        let uid = format!("{}-{:08x}", kind.to_lowercase(), self.next_uid);
        let version = self.bump_version();
        let meta = object.meta_mut();
        meta.uid = uid;
        meta.resource_version = version;
        meta.deletion_timestamp = None;

        self.store.insert(key.clone(), object.clone());
        info!(kind, %key, size = self.store.len(), "Created");
        self.publish(WatchEvent::Added(object.clone()));
        Ok(object)
    }

    fn update(&mut self, mut object: T) -> Result<T, StoreError> {
        let kind = T::KIND;
        let key = object.key();
        let Some(current) = self.store.get(&key) else {
            warn!(kind, %key, "Not found");
            return Err(StoreError::NotFound { kind, key });
        };
        check_version(&key, current, &object)?;

        let previous = current.clone();
        object.copy_status_from(&previous);
        let uid = previous.meta().uid.clone();
        let deletion_timestamp = previous.meta().deletion_timestamp;

        let version = self.bump_version();
        let meta = object.meta_mut();
        meta.uid = uid;
        meta.deletion_timestamp = deletion_timestamp;
        meta.resource_version = version;

        if deletion_timestamp.is_some() && object.meta().finalizers.is_empty() {
            self.store.remove(&key);
            info!(kind, %key, size = self.store.len(), "Finalizers cleared, erased");
            self.publish(WatchEvent::Deleted(object.clone()));
        } else {
            self.store.insert(key.clone(), object.clone());
            info!(kind, %key, version, "Updated");
            self.publish(WatchEvent::Modified {
                old: previous,
                new: object.clone(),
            });
        }
        Ok(object)
    }

    fn update_status(&mut self, object: T) -> Result<T, StoreError> {
        let kind = T::KIND;
        let key = object.key();
        let Some(current) = self.store.get(&key) else {
            warn!(kind, %key, "Not found");
            return Err(StoreError::NotFound { kind, key });
        };
        check_version(&key, current, &object)?;

        let previous = current.clone();
        let mut next = previous.clone();
        next.copy_status_from(&object);
        let version = self.bump_version();
        next.meta_mut().resource_version = version;

        self.store.insert(key.clone(), next.clone());
        info!(kind, %key, version, "Status updated");
        self.publish(WatchEvent::Modified {
            old: previous,
            new: next.clone(),
        });
        Ok(next)
    }

    fn delete(&mut self, key: ObjectKey) -> Result<(), StoreError> {
        let kind = T::KIND;
        let (has_finalizers, already_requested) = match self.store.get(&key) {
            Some(current) => (
                !current.meta().finalizers.is_empty(),
                current.meta().is_deletion_requested(),
            ),
            None => {
                warn!(kind, %key, "Not found");
                return Err(StoreError::NotFound { kind, key });
            }
        };

        if !has_finalizers {
            if let Some(removed) = self.store.remove(&key) {
                info!(kind, %key, size = self.store.len(), "Deleted");
                self.publish(WatchEvent::Deleted(removed));
            }
            return Ok(());
        }

        if already_requested {
            debug!(kind, %key, "Deletion already requested");
            return Ok(());
        }

        let version = self.bump_version();
        if let Some(current) = self.store.get_mut(&key) {
            let previous = current.clone();
            let meta = current.meta_mut();
            meta.deletion_timestamp = Some(SystemTime::now());
            meta.resource_version = version;
            let snapshot = current.clone();
            info!(kind, %key, finalizers = ?snapshot.meta().finalizers, "Deletion requested");
            self.publish(WatchEvent::Modified {
                old: previous,
                new: snapshot,
            });
        }
        Ok(())
    }

    fn bump_version(&mut self) -> u64 {
        self.resource_version += 1;
        self.resource_version
    }

    fn publish(&self, event: WatchEvent<T>) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

fn validate_key<T: Resource>(key: &ObjectKey) -> Result<(), StoreError> {
    let kind = T::KIND;
    if key.name.is_empty() {
        return Err(StoreError::Invalid {
            kind,
            reason: "metadata.name must be set".to_string(),
        });
    }
    if T::NAMESPACED && key.namespace.is_empty() {
        return Err(StoreError::Invalid {
            kind,
            reason: "metadata.namespace must be set".to_string(),
        });
    }
    if !T::NAMESPACED && !key.namespace.is_empty() {
        return Err(StoreError::Invalid {
            kind,
            reason: "cluster-scoped objects must not set metadata.namespace".to_string(),
        });
    }
    Ok(())
}

fn check_version<T: Resource>(key: &ObjectKey, current: &T, incoming: &T) -> Result<(), StoreError> {
    let expected = incoming.meta().resource_version;
    let actual = current.meta().resource_version;
    if expected != actual {
        warn!(kind = T::KIND, %key, expected, actual, "Stale resource version");
        return Err(StoreError::Conflict {
            kind: T::KIND,
            key: key.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::meta::ObjectMeta;

    #[derive(Clone, Debug, PartialEq)]
    struct Widget {
        metadata: ObjectMeta,
        color: String,
        seen: u32,
    }

    impl Resource for Widget {
        const KIND: &'static str = "Widget";
        const NAMESPACED: bool = true;

        fn meta(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }

        fn copy_status_from(&mut self, other: &Self) {
            self.seen = other.seen;
        }
    }

    fn widget(ns: &str, name: &str) -> Widget {
        Widget {
            metadata: ObjectMeta::namespaced(ns, name),
            color: "red".into(),
            seen: 0,
        }
    }

    fn spawn_store() -> ResourceClient<Widget> {
        let (actor, client) = ResourceActor::<Widget>::new(10, 16);
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_rejects_duplicates() {
        let client = spawn_store();

        let created = client.create(widget("a", "w1")).await.unwrap();
        assert!(!created.metadata.uid.is_empty());
        assert_eq!(created.metadata.resource_version, 1);

        let err = client.create(widget("a", "w1")).await.unwrap_err();
        assert!(err.is_already_exists());

        let err = client.create(widget("", "w2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_by_namespace_in_key_order() {
        let client = spawn_store();
        client.create(widget("b", "w2")).await.unwrap();
        client.create(widget("a", "w1")).await.unwrap();
        client.create(widget("b", "w1")).await.unwrap();

        let all = client.list(None).await.unwrap();
        let keys: Vec<String> = all.iter().map(|w| w.key().to_string()).collect();
        assert_eq!(keys, vec!["a/w1", "b/w1", "b/w2"]);

        let only_b = client.list(Some("b")).await.unwrap();
        assert_eq!(only_b.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let client = spawn_store();
        let created = client.create(widget("a", "w1")).await.unwrap();

        let mut first = created.clone();
        first.color = "blue".into();
        client.update(first).await.unwrap();

        let mut stale = created;
        stale.color = "green".into();
        let err = client.update(stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_and_update_status_touch_disjoint_parts() {
        let client = spawn_store();
        let created = client.create(widget("a", "w1")).await.unwrap();

        let mut status = created.clone();
        status.seen = 7;
        status.color = "ignored".into();
        let after_status = client.update_status(status).await.unwrap();
        assert_eq!(after_status.seen, 7);
        assert_eq!(after_status.color, "red");

        let mut spec = after_status.clone();
        spec.seen = 0;
        spec.color = "blue".into();
        let after_spec = client.update(spec).await.unwrap();
        assert_eq!(after_spec.seen, 7);
        assert_eq!(after_spec.color, "blue");
    }

    #[tokio::test]
    async fn test_delete_with_finalizer_marks_then_erases_on_release() {
        let client = spawn_store();
        let mut w = widget("a", "w1");
        w.metadata.add_finalizer("test/finalizer");
        client.create(w).await.unwrap();
        let key = ObjectKey::namespaced("a", "w1");

        client.delete(key.clone()).await.unwrap();
        let marked = client.get(key.clone()).await.unwrap().unwrap();
        let stamp = marked.metadata.deletion_timestamp;
        assert!(stamp.is_some());

        // Second request keeps the original marker.
        client.delete(key.clone()).await.unwrap();
        let again = client.get(key.clone()).await.unwrap().unwrap();
        assert_eq!(again.metadata.deletion_timestamp, stamp);

        // Updates can neither clear the marker nor keep the object once finalizers are gone.
        let mut cleared = again.clone();
        cleared.metadata.deletion_timestamp = None;
        let kept = client.update(cleared).await.unwrap();
        assert_eq!(kept.metadata.deletion_timestamp, stamp);

        let mut release = kept;
        release.metadata.remove_finalizer("test/finalizer");
        client.update(release).await.unwrap();
        assert!(client.get(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let client = spawn_store();
        let err = client.delete(ObjectKey::namespaced("a", "nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_watch_sees_writes() {
        let client = spawn_store();
        let mut events = client.watch().await.unwrap();

        let created = client.create(widget("a", "w1")).await.unwrap();
        client.delete(created.key()).await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), WatchEvent::Added(_)));
        assert!(matches!(events.recv().await.unwrap(), WatchEvent::Deleted(_)));
    }

    #[tokio::test]
    async fn test_modified_event_carries_previous_object() {
        let client = spawn_store();
        let created = client.create(widget("a", "w1")).await.unwrap();
        let mut events = client.watch().await.unwrap();

        let mut repainted = created.clone();
        repainted.color = "blue".into();
        client.update(repainted).await.unwrap();

        match events.recv().await.unwrap() {
            WatchEvent::Modified { old, new } => {
                assert_eq!(old.color, "red");
                assert_eq!(new.color, "blue");
                assert_eq!(old.metadata.resource_version, created.metadata.resource_version);
            }
            other => panic!("expected Modified, got {other:?}"),
        }
    }
}
