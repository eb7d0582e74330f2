use crate::admission::error::AdmissionError;
use crate::admission::review::{AdmissionRequest, AdmissionResponse, Operation};
use crate::framework::{Resource, ResourceClient};
use crate::model::Item;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Validates Item writes before they reach the store.
#[derive(Clone)]
pub struct ItemValidator {
    reader: ResourceClient<Item>,
    timeout: Duration,
}

impl ItemValidator {
    /// `reader` must talk to the authoritative Item actor; `timeout` bounds the
    /// lookup of a `copy_of` target.
    pub fn new(reader: ResourceClient<Item>, timeout: Duration) -> Self {
        Self { reader, timeout }
    }

    #[tracing::instrument(skip(self, request), fields(operation = %request.operation, key = %request.new.key()))]
    pub async fn review(&self, request: AdmissionRequest<'_>) -> AdmissionResponse {
        match self.validate(&request).await {
            Ok(()) => {
                info!("Allowed");
                AdmissionResponse::Allowed
            }
            Err(e) => {
                info!(reason = %e, "Denied");
                AdmissionResponse::Denied {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Runs the checks in order and returns the first violation.
    pub async fn validate(&self, request: &AdmissionRequest<'_>) -> Result<(), AdmissionError> {
        let item = request.new;
        if request.operation == Operation::Delete {
            return Ok(());
        }

        self.validate_copy_of_reference(item).await?;
        if let Some(old) = request.old.filter(|old| old.is_original() && item.is_copy()) {
            self.validate_not_copied(old).await?;
        }

        if item.is_copy() && !item.spec.has_any_field() {
            return Err(match request.operation {
                Operation::Create => AdmissionError::MissingOverrideOnCreate,
                _ => AdmissionError::MissingOverrideOnUpdate,
            });
        }
        if item.is_original() && !item.spec.has_all_fields() {
            return Err(AdmissionError::Incomplete);
        }
        Ok(())
    }

    async fn validate_copy_of_reference(&self, item: &Item) -> Result<(), AdmissionError> {
        let Some(reference) = &item.spec.copy_of else {
            return Ok(());
        };
        let key = item.key();
        debug!(%key, copy_of = %reference.key(), "Validating copyOf reference");

        if reference.points_at(&key) {
            return Err(AdmissionError::SelfReference);
        }

        let target = match tokio::time::timeout(self.timeout, self.reader.get(reference.key())).await {
            Ok(Ok(target)) => target,
            Ok(Err(e)) => {
                warn!(%key, error = %e, "copyOf lookup failed");
                return Err(AdmissionError::LookupFailed);
            }
            Err(_) => {
                warn!(%key, timeout = ?self.timeout, "copyOf lookup timed out");
                return Err(AdmissionError::LookupFailed);
            }
        };

        match target {
            None => Err(AdmissionError::TargetNotFound),
            Some(target) if target.is_copy() => Err(AdmissionError::CopyOfCopy),
            Some(_) => Ok(()),
        }
    }

    /// Denies turning `original` into a copy while any Item still copies it.
    async fn validate_not_copied(&self, original: &Item) -> Result<(), AdmissionError> {
        let key = original.key();
        let all = match tokio::time::timeout(self.timeout, self.reader.list(None)).await {
            Ok(Ok(all)) => all,
            Ok(Err(e)) => {
                warn!(%key, error = %e, "Copy lookup failed");
                return Err(AdmissionError::LookupFailed);
            }
            Err(_) => {
                warn!(%key, timeout = ?self.timeout, "Copy lookup timed out");
                return Err(AdmissionError::LookupFailed);
            }
        };
        let copied = all.iter().any(|item| {
            item.spec
                .copy_of
                .as_ref()
                .is_some_and(|reference| reference.points_at(&key))
        });
        if copied {
            return Err(AdmissionError::CopiedOriginal);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_client, MockClient};
    use crate::framework::{ObjectKey, ResourceActor, StoreError};
    use crate::model::{CopyReference, ItemSpec};

    fn dune() -> Item {
        Item::original("downtown", "dune", "Dune", "9.99", "scifi")
    }

    fn copy_of(namespace: &str, name: &str) -> Item {
        Item::copy("uptown", "dune", CopyReference::new(namespace, name))
    }

    async fn validator_with(items: Vec<Item>) -> ItemValidator {
        let (actor, client) = ResourceActor::<Item>::new(10, 16);
        tokio::spawn(actor.run());
        for item in items {
            client.create(item).await.unwrap();
        }
        ItemValidator::new(client, Duration::from_secs(1))
    }

    fn denied(message: &str) -> AdmissionResponse {
        AdmissionResponse::Denied {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_complete_original_is_allowed() {
        let validator = validator_with(vec![]).await;
        let response = validator.review(AdmissionRequest::create(&dune())).await;
        assert_eq!(response, AdmissionResponse::Allowed);
    }

    #[tokio::test]
    async fn test_original_missing_any_field_is_denied() {
        let validator = validator_with(vec![]).await;
        let expected =
            denied("an Item without copyOf must have spec.title, spec.price, and spec.genre set (non-zero)");

        let clears: [(&str, fn(&mut ItemSpec)); 3] = [
            ("title", |spec| spec.title.clear()),
            ("price", |spec| spec.price.clear()),
            ("genre", |spec| spec.genre.clear()),
        ];
        for (field, clear) in clears {
            let mut item = dune();
            clear(&mut item.spec);

            let on_create = validator.review(AdmissionRequest::create(&item)).await;
            assert_eq!(on_create, expected, "create without {field}");
            let on_update = validator.review(AdmissionRequest::update(&dune(), &item)).await;
            assert_eq!(on_update, expected, "update without {field}");
        }
    }

    #[tokio::test]
    async fn test_self_reference_is_denied() {
        let validator = validator_with(vec![]).await;
        let item = copy_of("uptown", "dune").with_title("Dune II");

        let response = validator.review(AdmissionRequest::create(&item)).await;
        assert_eq!(response, denied("item cannot reference itself in spec.copyOf"));
    }

    #[tokio::test]
    async fn test_missing_target_is_denied() {
        let validator = validator_with(vec![]).await;
        let item = copy_of("downtown", "dune").with_title("Dune II");

        let response = validator.review(AdmissionRequest::create(&item)).await;
        assert_eq!(response, denied("spec.copyOf references non-existent Item"));
    }

    #[tokio::test]
    async fn test_copy_of_copy_is_denied() {
        let middle = Item::copy("midtown", "dune", CopyReference::new("downtown", "dune")).with_price("8");
        let validator = validator_with(vec![dune(), middle]).await;
        let item = copy_of("midtown", "dune").with_title("Dune II");

        let response = validator.review(AdmissionRequest::create(&item)).await;
        assert_eq!(
            response,
            denied("a copy cannot reference another copy, only originals can be copied")
        );
    }

    #[tokio::test]
    async fn test_copy_needs_one_override() {
        let validator = validator_with(vec![dune()]).await;
        let bare = copy_of("downtown", "dune");

        assert_eq!(
            validator.review(AdmissionRequest::create(&bare)).await,
            denied("an Item with copyOf must override title, price, or genre in spec")
        );

        let old = bare.clone().with_genre("epic");
        assert_eq!(
            validator.review(AdmissionRequest::update(&old, &bare)).await,
            denied("when spec.copyOf is set, at least one of spec.title, spec.price, or spec.genre must be set (non-zero)")
        );

        let one = bare.with_price("7.99");
        assert!(validator.review(AdmissionRequest::create(&one)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_copied_original_cannot_become_a_copy() {
        let emma = Item::original("downtown", "emma", "Emma", "5.00", "classic");
        let copy = Item::copy("uptown", "emma", CopyReference::new("downtown", "emma")).with_price("4");
        let validator = validator_with(vec![dune(), emma.clone(), copy]).await;

        let demoted = Item::copy("downtown", "emma", CopyReference::new("downtown", "dune")).with_title("Emma");
        assert_eq!(
            validator.review(AdmissionRequest::update(&emma, &demoted)).await,
            denied("an Item that other Items copy cannot itself become a copy")
        );

        // Without copies pointing at it the same change is fine.
        let lonely = Item::original("midtown", "emma", "Emma", "5.00", "classic");
        let lonely_copy =
            Item::copy("midtown", "emma", CopyReference::new("downtown", "dune")).with_title("Emma");
        assert!(validator
            .review(AdmissionRequest::update(&lonely, &lonely_copy))
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_delete_is_always_allowed() {
        let validator = validator_with(vec![]).await;
        let broken = copy_of("uptown", "dune");
        assert!(validator.review(AdmissionRequest::delete(&broken)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_store_error_fails_closed() {
        let mut mock = MockClient::<Item>::new();
        mock.expect_get(ObjectKey::namespaced("downtown", "dune"))
            .return_err(StoreError::Unavailable("down".into()));
        let validator = ItemValidator::new(mock.client(), Duration::from_secs(1));

        let item = copy_of("downtown", "dune").with_title("Dune II");
        let err = validator.validate(&AdmissionRequest::create(&item)).await.unwrap_err();
        assert_eq!(err, AdmissionError::LookupFailed);
        mock.verify();
    }

    #[tokio::test]
    async fn test_slow_lookup_fails_closed() {
        // The receiver is held but never answered.
        let (client, _requests) = create_mock_client::<Item>(10);
        let validator = ItemValidator::new(client, Duration::from_millis(20));

        let item = copy_of("downtown", "dune").with_title("Dune II");
        let response = validator.review(AdmissionRequest::create(&item)).await;
        assert_eq!(response, denied("failed to validate spec.copyOf reference"));
    }
}
