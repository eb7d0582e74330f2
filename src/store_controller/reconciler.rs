use crate::framework::{
    Action, ObjectKey, OwnerReference, Reconciler, Resource, ResourceClient, StoreError,
};
use crate::model::{Item, Namespace, Store, STORE_FINALIZER};
use crate::store_controller::cleanup::cascade_delete;
use crate::store_controller::error::StoreReconcileError;
use crate::store_controller::state::StoreState;
use async_trait::async_trait;
use tracing::{debug, info};

/// Drives a Store through its lifecycle.
///
/// The reconciler holds clients for the three kinds it touches. Every write goes
/// straight to the store actors; none of them pass through Item admission.
pub struct StoreReconciler {
    stores: ResourceClient<Store>,
    namespaces: ResourceClient<Namespace>,
    items: ResourceClient<Item>,
}

impl StoreReconciler {
    pub fn new(
        stores: ResourceClient<Store>,
        namespaces: ResourceClient<Namespace>,
        items: ResourceClient<Item>,
    ) -> Self {
        Self {
            stores,
            namespaces,
            items,
        }
    }

    async fn add_finalizer(&self, mut store: Store) -> Result<Action, StoreReconcileError> {
        let key = store.key();
        store.metadata.add_finalizer(STORE_FINALIZER);
        self.stores
            .update(store)
            .await
            .map_err(|source| StoreReconcileError::AddFinalizer {
                key: key.clone(),
                source,
            })?;
        info!(%key, "Finalizer added");
        Ok(Action::Requeue)
    }

    async fn ensure_namespace(&self, mut store: Store) -> Result<Action, StoreReconcileError> {
        let key = store.key();
        let name = store.namespace_name().to_string();
        let namespace_error = |source: StoreError| StoreReconcileError::Namespace {
            name: name.clone(),
            source,
        };

        let existing = self
            .namespaces
            .get(ObjectKey::cluster(name.clone()))
            .await
            .map_err(namespace_error)?;
        if existing.is_some() {
            debug!(%key, namespace = %name, "Namespace present");
            return Ok(Action::AwaitChange);
        }

        let created = match self.namespaces.create(Namespace::new(name.clone())).await {
            Ok(created) => created,
            Err(e) if e.is_already_exists() => {
                debug!(%key, namespace = %name, "Namespace created concurrently");
                return Ok(Action::AwaitChange);
            }
            Err(e) => return Err(namespace_error(e)),
        };

        store.metadata.set_owner_reference(OwnerReference {
            api_version: "v1".to_string(),
            kind: Namespace::KIND.to_string(),
            name: created.metadata.name.clone(),
            uid: created.metadata.uid.clone(),
        });
        self.stores
            .update(store)
            .await
            .map_err(|source| StoreReconcileError::OwnerReference {
                key: key.clone(),
                source,
            })?;
        info!(%key, namespace = %name, uid = %created.metadata.uid, "Namespace created");
        Ok(Action::AwaitChange)
    }

    async fn finalize(&self, mut store: Store) -> Result<Action, StoreReconcileError> {
        let key = store.key();
        let namespace = store.namespace_name().to_string();
        info!(%key, %namespace, "Store is being deleted, running cleanup");

        let deleted = cascade_delete(&self.items, &namespace)
            .await
            .map_err(|source| StoreReconcileError::Cleanup {
                key: key.clone(),
                source,
            })?;

        store.metadata.remove_finalizer(STORE_FINALIZER);
        self.stores
            .update(store)
            .await
            .map_err(|source| StoreReconcileError::RemoveFinalizer {
                key: key.clone(),
                source,
            })?;
        info!(%key, deleted, "Finalizer removed");
        Ok(Action::AwaitChange)
    }
}

#[async_trait]
impl Reconciler for StoreReconciler {
    type Error = StoreReconcileError;
    const NAME: &'static str = "store";

    async fn reconcile(&self, key: &ObjectKey) -> Result<Action, StoreReconcileError> {
        let store = self
            .stores
            .get(key.clone())
            .await
            .map_err(|source| StoreReconcileError::Fetch {
                key: key.clone(),
                source,
            })?;

        let state = StoreState::classify(store);
        debug!(%key, state = state.name(), "Reconciling Store");

        match state {
            StoreState::Gone | StoreState::Released(_) => Ok(Action::AwaitChange),
            StoreState::PendingFinalizer(store) => self.add_finalizer(store).await,
            StoreState::Active(store) => self.ensure_namespace(store).await,
            StoreState::Terminating(store) => self.finalize(store).await,
        }
    }

    fn is_conflict(&self, error: &StoreReconcileError) -> bool {
        error.is_conflict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::ResourceActor;
    use crate::model::CopyReference;

    struct Fixture {
        stores: ResourceClient<Store>,
        namespaces: ResourceClient<Namespace>,
        items: ResourceClient<Item>,
        reconciler: StoreReconciler,
    }

    fn fixture() -> Fixture {
        let (store_actor, stores) = ResourceActor::<Store>::new(10, 16);
        let (namespace_actor, namespaces) = ResourceActor::<Namespace>::new(10, 16);
        let (item_actor, items) = ResourceActor::<Item>::new(10, 16);
        tokio::spawn(store_actor.run());
        tokio::spawn(namespace_actor.run());
        tokio::spawn(item_actor.run());
        let reconciler = StoreReconciler::new(stores.clone(), namespaces.clone(), items.clone());
        Fixture {
            stores,
            namespaces,
            items,
            reconciler,
        }
    }

    #[tokio::test]
    async fn test_first_pass_only_adds_finalizer() {
        let f = fixture();
        f.stores.create(Store::new("downtown")).await.unwrap();
        let key = ObjectKey::cluster("downtown");

        let action = f.reconciler.reconcile(&key).await.unwrap();
        assert_eq!(action, Action::Requeue);

        let store = f.stores.get(key).await.unwrap().unwrap();
        assert!(store.metadata.has_finalizer(STORE_FINALIZER));
        assert!(f.namespaces.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_store_gets_namespace_and_owner_reference() {
        let f = fixture();
        f.stores.create(Store::new("downtown")).await.unwrap();
        let key = ObjectKey::cluster("downtown");

        f.reconciler.reconcile(&key).await.unwrap();
        let action = f.reconciler.reconcile(&key).await.unwrap();
        assert_eq!(action, Action::AwaitChange);

        let namespace = f
            .namespaces
            .get(ObjectKey::cluster("downtown"))
            .await
            .unwrap()
            .expect("namespace created");
        let store = f.stores.get(key.clone()).await.unwrap().unwrap();
        assert_eq!(
            store.metadata.owner_references,
            vec![OwnerReference {
                api_version: "v1".into(),
                kind: "Namespace".into(),
                name: "downtown".into(),
                uid: namespace.metadata.uid.clone(),
            }]
        );

        // Converged: another pass writes nothing.
        f.reconciler.reconcile(&key).await.unwrap();
        let again = f.stores.get(key).await.unwrap().unwrap();
        assert_eq!(again.metadata.resource_version, store.metadata.resource_version);
    }

    #[tokio::test]
    async fn test_existing_namespace_is_left_alone() {
        let f = fixture();
        f.namespaces.create(Namespace::new("downtown")).await.unwrap();
        let mut store = Store::new("downtown");
        store.metadata.add_finalizer(STORE_FINALIZER);
        let created = f.stores.create(store).await.unwrap();

        f.reconciler.reconcile(&created.key()).await.unwrap();
        let after = f.stores.get(created.key()).await.unwrap().unwrap();
        assert!(after.metadata.owner_references.is_empty());
        assert_eq!(f.namespaces.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terminating_store_cleans_up_then_disappears() {
        let f = fixture();
        let mut store = Store::new("downtown");
        store.metadata.add_finalizer(STORE_FINALIZER);
        f.stores.create(store).await.unwrap();
        f.items
            .create(Item::original("downtown", "dune", "Dune", "9.99", "scifi"))
            .await
            .unwrap();
        f.items
            .create(Item::copy("uptown", "dune", CopyReference::new("downtown", "dune")).with_genre("epic"))
            .await
            .unwrap();
        f.items
            .create(Item::original("uptown", "emma", "Emma", "5", "classic"))
            .await
            .unwrap();

        let key = ObjectKey::cluster("downtown");
        f.stores.delete(key.clone()).await.unwrap();
        assert!(f.stores.get(key.clone()).await.unwrap().is_some());

        f.reconciler.reconcile(&key).await.unwrap();
        assert!(f.stores.get(key.clone()).await.unwrap().is_none());

        let left = f.items.list(None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].metadata.name, "emma");

        // Gone is a no-op.
        assert_eq!(f.reconciler.reconcile(&key).await.unwrap(), Action::AwaitChange);
    }

    #[tokio::test]
    async fn test_stale_finalizer_write_is_a_conflict() {
        let f = fixture();
        let created = f.stores.create(Store::new("downtown")).await.unwrap();
        let mut touched = created.clone();
        touched.metadata.add_finalizer("someone.else/finalizer");
        f.stores.update(touched).await.unwrap();

        // Write with the version read before the concurrent update.
        let err = f.reconciler.add_finalizer(created).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
