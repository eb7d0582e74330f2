//! # Store Client
//!
//! Thin wrapper over `ResourceClient<Store>` for callers.
use crate::clients::error::ClientError;
use crate::framework::{ActorClient, ResourceClient};
use crate::model::Store;
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct StoreClient {
    inner: ResourceClient<Store>,
}

impl StoreClient {
    pub fn new(inner: ResourceClient<Store>) -> Self {
        Self { inner }
    }

    /// Creates an empty Store. The reconciler adds its finalizer and namespace.
    #[instrument(skip(self))]
    pub async fn create_store(&self, name: &str) -> Result<Store, ClientError> {
        debug!("Sending request");
        Ok(self.inner.create(Store::new(name)).await?)
    }
}

#[async_trait]
impl ActorClient<Store> for StoreClient {
    type Error = ClientError;

    fn inner(&self) -> &ResourceClient<Store> {
        &self.inner
    }
}
