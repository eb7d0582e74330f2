//! # Catalog Operator Demo
//!
//! Starts the operator, creates a Store holding an original Item, copies it from a
//! second Store, then deletes the first Store and watches the cascade.

use catalog_operator::clients::ClientError;
use catalog_operator::config::OperatorConfig;
use catalog_operator::framework::{ActorClient, ObjectKey};
use catalog_operator::lifecycle::{setup_tracing, OperatorSystem};
use catalog_operator::model::{CopyReference, Item};
use std::time::Duration;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = match std::env::var("CATALOG_OPERATOR_CONFIG") {
        Ok(path) => OperatorConfig::load(&path).map_err(|e| e.to_string())?,
        Err(_) => OperatorConfig::default(),
    };

    info!("Starting catalog operator demo");
    let system = OperatorSystem::start(&config);

    let span = tracing::info_span!("store_setup");
    async {
        for name in ["downtown", "uptown"] {
            system
                .store_client
                .create_store(name)
                .await
                .map_err(|e| e.to_string())?;
            info!(store = name, "Store created");
        }
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("catalog");
    async {
        system
            .item_client
            .create_item(Item::original("downtown", "dune", "Dune", "9.99", "scifi"))
            .await
            .map_err(|e| e.to_string())?;

        let copy = Item::copy("uptown", "dune", CopyReference::new("downtown", "dune"))
            .with_price("7.99");
        system
            .item_client
            .create_item(copy)
            .await
            .map_err(|e| e.to_string())?;

        // Rejected: a copy must override at least one field.
        let bare = Item::copy("uptown", "dune-2", CopyReference::new("downtown", "dune"));
        match system.item_client.create_item(bare).await {
            Err(ClientError::Rejected(message)) => info!(%message, "Admission denied as expected"),
            Ok(_) => error!("Admission accepted a copy without overrides"),
            Err(e) => return Err(e.to_string()),
        }
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let original = ObjectKey::namespaced("downtown", "dune");
    let items = &system.item_client;
    let key = &original;
    let count = wait_for(move || async move {
        let item = items.get(key.clone()).await.ok()??;
        (item.status.copy_count == 1).then_some(item.status.copy_count)
    })
    .await;
    match count {
        Some(count) => info!(%original, count, "Copy count converged"),
        None => error!(%original, "Copy count did not converge"),
    }

    let span = tracing::info_span!("store_deletion");
    async {
        system
            .store_client
            .delete(ObjectKey::cluster("downtown"))
            .await
            .map_err(|e| e.to_string())?;

        let stores = &system.store_client;
        let gone = wait_for(move || async move {
            let store = stores.get(ObjectKey::cluster("downtown")).await.ok()?;
            store.is_none().then_some(())
        })
        .await;
        let remaining = system
            .item_client
            .list(None)
            .await
            .map_err(|e| e.to_string())?;
        info!(erased = gone.is_some(), remaining = remaining.len(), "Store deletion finished");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}

/// Polls `check` until it yields a value or five seconds pass.
async fn wait_for<T, F, Fut>(mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
