//! # Mock Framework
//!
//! Utilities for testing reconcilers and clients without a real store actor.
//!
//! Use [`MockClient`] to script responses in order, or [`create_mock_client`] to get a
//! client plus the raw request receiver and answer (or withhold) each reply by hand.

use crate::framework::{ObjectKey, Resource, ResourceClient, ResourceRequest, Response, StoreError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the reply to send for it.
enum Expectation<T: Resource> {
    Get {
        key: ObjectKey,
        response: Result<Option<T>, StoreError>,
    },
    List {
        response: Result<Vec<T>, StoreError>,
    },
    Create {
        response: Result<T, StoreError>,
    },
    Update {
        response: Result<T, StoreError>,
    },
    UpdateStatus {
        response: Result<T, StoreError>,
    },
    Delete {
        key: ObjectKey,
        response: Result<(), StoreError>,
    },
}

impl<T: Resource> Expectation<T> {
    fn describe(&self) -> String {
        match self {
            Expectation::Get { key, .. } => format!("get {key}"),
            Expectation::List { .. } => "list".to_string(),
            Expectation::Create { .. } => "create".to_string(),
            Expectation::Update { .. } => "update".to_string(),
            Expectation::UpdateStatus { .. } => "update_status".to_string(),
            Expectation::Delete { key, .. } => format!("delete {key}"),
        }
    }
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn push<T: Resource>(expectations: &Expectations<T>, expectation: Expectation<T>) {
    expectations
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_back(expectation);
}

/// A scripted stand-in for a `ResourceActor`.
///
/// Requests must arrive in the order the expectations were registered. Keys given to
/// `expect_get` and `expect_delete` are checked against the request.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<Item>::new();
/// mock.expect_list().return_ok(vec![item]);
/// mock.expect_delete(key).return_err(StoreError::Unavailable("down".into()));
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<T: Resource> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Resource> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Get { key, respond_to },
                        Some(Expectation::Get {
                            key: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(key, expected, "get for unexpected key");
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to, .. }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Update { respond_to, .. }, Some(Expectation::Update { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::UpdateStatus { respond_to, .. },
                        Some(Expectation::UpdateStatus { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Delete { key, respond_to },
                        Some(Expectation::Delete {
                            key: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(key, expected, "delete for unexpected key");
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected {} request, expected {}",
                            request_name(&request),
                            expectation.map_or_else(|| "nothing".to_string(), |e| e.describe())
                        );
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self, key: ObjectKey) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            key,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_list(&mut self) -> ListExpectationBuilder<T> {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_create(&mut self) -> WriteExpectationBuilder<T> {
        WriteExpectationBuilder {
            verb: WriteVerb::Create,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_update(&mut self) -> WriteExpectationBuilder<T> {
        WriteExpectationBuilder {
            verb: WriteVerb::Update,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_update_status(&mut self) -> WriteExpectationBuilder<T> {
        WriteExpectationBuilder {
            verb: WriteVerb::UpdateStatus,
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_delete(&mut self, key: ObjectKey) -> DeleteExpectationBuilder<T> {
        DeleteExpectationBuilder {
            key,
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap_or_else(PoisonError::into_inner);
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

impl<T: Resource> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn request_name<T: Resource>(request: &ResourceRequest<T>) -> &'static str {
    match request {
        ResourceRequest::Create { .. } => "create",
        ResourceRequest::Get { .. } => "get",
        ResourceRequest::List { .. } => "list",
        ResourceRequest::Update { .. } => "update",
        ResourceRequest::UpdateStatus { .. } => "update_status",
        ResourceRequest::Delete { .. } => "delete",
        ResourceRequest::Watch { .. } => "watch",
    }
}

/// Builder for `get` expectations.
pub struct GetExpectationBuilder<T: Resource> {
    key: ObjectKey,
    expectations: Expectations<T>,
}

impl<T: Resource> GetExpectationBuilder<T> {
    pub fn return_ok(self, value: Option<T>) {
        push(
            &self.expectations,
            Expectation::Get {
                key: self.key,
                response: Ok(value),
            },
        );
    }

    pub fn return_err(self, error: StoreError) {
        push(
            &self.expectations,
            Expectation::Get {
                key: self.key,
                response: Err(error),
            },
        );
    }
}

/// Builder for `list` expectations.
pub struct ListExpectationBuilder<T: Resource> {
    expectations: Expectations<T>,
}

impl<T: Resource> ListExpectationBuilder<T> {
    pub fn return_ok(self, objects: Vec<T>) {
        push(&self.expectations, Expectation::List { response: Ok(objects) });
    }

    pub fn return_err(self, error: StoreError) {
        push(&self.expectations, Expectation::List { response: Err(error) });
    }
}

enum WriteVerb {
    Create,
    Update,
    UpdateStatus,
}

/// Builder for `create`, `update` and `update_status` expectations.
pub struct WriteExpectationBuilder<T: Resource> {
    verb: WriteVerb,
    expectations: Expectations<T>,
}

impl<T: Resource> WriteExpectationBuilder<T> {
    pub fn return_ok(self, object: T) {
        self.finish(Ok(object));
    }

    pub fn return_err(self, error: StoreError) {
        self.finish(Err(error));
    }

    fn finish(self, response: Result<T, StoreError>) {
        let expectation = match self.verb {
            WriteVerb::Create => Expectation::Create { response },
            WriteVerb::Update => Expectation::Update { response },
            WriteVerb::UpdateStatus => Expectation::UpdateStatus { response },
        };
        push(&self.expectations, expectation);
    }
}

/// Builder for `delete` expectations.
pub struct DeleteExpectationBuilder<T: Resource> {
    key: ObjectKey,
    expectations: Expectations<T>,
}

impl<T: Resource> DeleteExpectationBuilder<T> {
    pub fn return_ok(self) {
        push(
            &self.expectations,
            Expectation::Delete {
                key: self.key,
                response: Ok(()),
            },
        );
    }

    pub fn return_err(self, error: StoreError) {
        push(
            &self.expectations,
            Expectation::Delete {
                key: self.key,
                response: Err(error),
            },
        );
    }
}

// =============================================================================
// RAW RECEIVER HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// # Testing Strategy
/// Holding the receiver lets a test inspect each request and decide when, or
/// whether, to answer it. Never answering is how timeouts are exercised.
pub fn create_mock_client<T: Resource>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Resource>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(ObjectKey, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Resource>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { object, respond_to }) => Some((object, respond_to)),
        _ => None,
    }
}
