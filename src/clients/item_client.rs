//! # Item Client
//!
//! Caller-facing API for Items. Creates and updates are reviewed by the
//! [`ItemValidator`] first; a denial never reaches the store actor.
use crate::admission::{AdmissionRequest, AdmissionResponse, ItemValidator};
use crate::clients::error::ClientError;
use crate::framework::{ActorClient, Resource, ResourceClient, StoreError};
use crate::model::Item;
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ItemClient {
    inner: ResourceClient<Item>,
    validator: ItemValidator,
}

impl ItemClient {
    pub fn new(inner: ResourceClient<Item>, validator: ItemValidator) -> Self {
        Self { inner, validator }
    }

    #[instrument(skip(self, item), fields(key = %item.key()))]
    pub async fn create_item(&self, item: Item) -> Result<Item, ClientError> {
        admit(self.validator.review(AdmissionRequest::create(&item)).await)?;
        debug!("Sending request");
        Ok(self.inner.create(item).await?)
    }

    /// Replaces spec and metadata of an existing Item.
    ///
    /// `item.metadata.resource_version` must match the stored object.
    #[instrument(skip(self, item), fields(key = %item.key()))]
    pub async fn update_item(&self, item: Item) -> Result<Item, ClientError> {
        let key = item.key();
        let old = self
            .inner
            .get(key.clone())
            .await?
            .ok_or(StoreError::NotFound {
                kind: Item::KIND,
                key,
            })?;
        admit(self.validator.review(AdmissionRequest::update(&old, &item)).await)?;
        debug!("Sending request");
        Ok(self.inner.update(item).await?)
    }
}

fn admit(response: AdmissionResponse) -> Result<(), ClientError> {
    match response {
        AdmissionResponse::Allowed => Ok(()),
        AdmissionResponse::Denied { message } => Err(ClientError::Rejected(message)),
    }
}

#[async_trait]
impl ActorClient<Item> for ItemClient {
    type Error = ClientError;

    fn inner(&self) -> &ResourceClient<Item> {
        &self.inner
    }
}
