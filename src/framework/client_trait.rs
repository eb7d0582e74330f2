//! # ActorClient Trait
//!
//! Provides a common interface for kind-specific clients, adding default `get`,
//! `list` and `delete` methods on top of a generic `ResourceClient`.
use crate::framework::{ObjectKey, Resource, ResourceClient, StoreError};
use async_trait::async_trait;

/// Trait for kind-specific clients to inherit the plain read and delete operations.
///
/// Writes that need extra checks (admission, payload conversion) stay on the
/// concrete client; everything else comes from here.
#[async_trait]
pub trait ActorClient<T: Resource>: Send + Sync {
    /// The kind-specific error type.
    type Error: From<StoreError> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Fetch an object by key.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    async fn get(&self, key: ObjectKey) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(key).await.map_err(Self::Error::from)
    }

    /// List objects, optionally restricted to one namespace.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(namespace).await.map_err(Self::Error::from)
    }

    /// Request deletion of an object by key.
    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    async fn delete(&self, key: ObjectKey) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(key).await.map_err(Self::Error::from)
    }
}
