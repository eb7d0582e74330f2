use crate::framework::{Action, ObjectKey, Reconciler, ResourceClient};
use crate::item_controller::error::ItemReconcileError;
use crate::model::Item;
use async_trait::async_trait;
use tracing::{debug, info};

/// Recomputes the copy count of original Items.
pub struct ItemReconciler {
    items: ResourceClient<Item>,
}

impl ItemReconciler {
    pub fn new(items: ResourceClient<Item>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl Reconciler for ItemReconciler {
    type Error = ItemReconcileError;
    const NAME: &'static str = "item";

    /// Absent Items and copies are left alone. For an original, all Items are listed
    /// and the count is written back only when it changed.
    async fn reconcile(&self, key: &ObjectKey) -> Result<Action, ItemReconcileError> {
        let item = self
            .items
            .get(key.clone())
            .await
            .map_err(|source| ItemReconcileError::Fetch {
                key: key.clone(),
                source,
            })?;

        let Some(mut item) = item else {
            debug!(%key, "Item gone");
            return Ok(Action::AwaitChange);
        };
        if item.is_copy() {
            debug!(%key, "Copy, nothing to count");
            return Ok(Action::AwaitChange);
        }

        let all = self
            .items
            .list(None)
            .await
            .map_err(ItemReconcileError::List)?;
        let count = count_copies(&all, key);

        if item.status.copy_count == count {
            debug!(%key, count, "Copy count unchanged");
            return Ok(Action::AwaitChange);
        }

        let previous = item.status.copy_count;
        item.status.copy_count = count;
        self.items
            .update_status(item)
            .await
            .map_err(|source| ItemReconcileError::StatusUpdate {
                key: key.clone(),
                source,
            })?;
        info!(%key, previous, count, "Copy count updated");
        Ok(Action::AwaitChange)
    }

    fn is_conflict(&self, error: &ItemReconcileError) -> bool {
        error.is_conflict()
    }
}

/// Number of `items` whose `copy_of` is exactly `original`.
pub fn count_copies(items: &[Item], original: &ObjectKey) -> u32 {
    let count = items
        .iter()
        .filter(|item| {
            item.spec
                .copy_of
                .as_ref()
                .is_some_and(|reference| reference.points_at(original))
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Maps a changed Item to the original it copies, if any.
pub fn copy_of_mapper(item: &Item) -> Vec<ObjectKey> {
    match &item.spec.copy_of {
        Some(reference) if reference.is_complete() => vec![reference.key()],
        _ => Vec::new(),
    }
}
