//! Cascade delete of the Items that depend on a Store.

use crate::framework::{Resource, ResourceClient, StoreError};
use crate::model::Item;
use crate::store_controller::error::CleanupError;
use tracing::{debug, info};

/// Deletes every Item in `namespace`, then every Item elsewhere copying into it.
///
/// Items that vanish in between count as deleted. The first other failure stops the
/// run; nothing is remembered, so the whole cleanup can simply be run again.
///
/// Returns how many delete requests succeeded.
pub async fn cascade_delete(
    items: &ResourceClient<Item>,
    namespace: &str,
) -> Result<usize, CleanupError> {
    let mut deleted = 0;

    let owned = items
        .list(Some(namespace))
        .await
        .map_err(|source| list_error(namespace, source))?;
    for item in owned {
        if delete_item(items, &item).await? {
            info!(key = %item.key(), "Deleted Item in store namespace");
            deleted += 1;
        }
    }

    let all = items
        .list(None)
        .await
        .map_err(|source| list_error(namespace, source))?;
    let copies = all.iter().filter(|item| {
        item.spec
            .copy_of
            .as_ref()
            .is_some_and(|reference| reference.namespace == namespace)
    });
    for item in copies {
        if delete_item(items, item).await? {
            info!(key = %item.key(), copy_of = ?item.spec.copy_of, "Deleted copy Item");
            deleted += 1;
        }
    }

    Ok(deleted)
}

/// `Ok(false)` when the Item was already gone.
async fn delete_item(items: &ResourceClient<Item>, item: &Item) -> Result<bool, CleanupError> {
    let key = item.key();
    match items.delete(key.clone()).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => {
            debug!(%key, "Item already gone");
            Ok(false)
        }
        Err(source) => Err(CleanupError::Delete { key, source }),
    }
}

fn list_error(namespace: &str, source: StoreError) -> CleanupError {
    CleanupError::List {
        namespace: namespace.to_string(),
        source,
    }
}
