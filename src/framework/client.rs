//! # Store Client
//!
//! This module defines the generic client for talking to a store actor.

use crate::framework::error::StoreError;
use crate::framework::message::{ResourceRequest, Response, WatchEvent};
use crate::framework::meta::ObjectKey;
use crate::framework::resource::Resource;
use tokio::sync::{broadcast, mpsc, oneshot};

/// A type-safe client for interacting with a `ResourceActor`.
///
/// ## ResourceClient
///
/// The `ResourceClient<T>` forwards requests over a Tokio mpsc channel and returns
/// results via oneshot channels. It holds only a sender, so it is cheap to clone and
/// share across reconcile tasks.
///
/// Anything that answers `ResourceRequest<T>` messages can stand behind it: the real
/// [`ResourceActor`](crate::framework::ResourceActor) or a
/// [`MockClient`](crate::framework::mock::MockClient) in tests.
#[derive(Clone)]
pub struct ResourceClient<T: Resource> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, object: T) -> Result<T, StoreError> {
        self.call(|respond_to| ResourceRequest::Create { object, respond_to })
            .await
    }

    /// Fetches one object. Absence is `Ok(None)`.
    pub async fn get(&self, key: ObjectKey) -> Result<Option<T>, StoreError> {
        self.call(|respond_to| ResourceRequest::Get { key, respond_to })
            .await
    }

    /// Lists all objects, or only those in `namespace`.
    pub async fn list(&self, namespace: Option<&str>) -> Result<Vec<T>, StoreError> {
        let namespace = namespace.map(str::to_string);
        self.call(|respond_to| ResourceRequest::List {
            namespace,
            respond_to,
        })
        .await
    }

    pub async fn update(&self, object: T) -> Result<T, StoreError> {
        self.call(|respond_to| ResourceRequest::Update { object, respond_to })
            .await
    }

    pub async fn update_status(&self, object: T) -> Result<T, StoreError> {
        self.call(|respond_to| ResourceRequest::UpdateStatus { object, respond_to })
            .await
    }

    pub async fn delete(&self, key: ObjectKey) -> Result<(), StoreError> {
        self.call(|respond_to| ResourceRequest::Delete { key, respond_to })
            .await
    }

    /// Subscribes to change events published after this call returns.
    pub async fn watch(&self) -> Result<broadcast::Receiver<WatchEvent<T>>, StoreError> {
        self.call(|respond_to| ResourceRequest::Watch { respond_to })
            .await
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }
}
