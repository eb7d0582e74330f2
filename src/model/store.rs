use crate::framework::{ObjectMeta, Resource};
use serde::{Deserialize, Serialize};

/// Finalizer the Store reconciler places on every Store it manages.
pub const STORE_FINALIZER: &str = "catalog.example.com/finalizer";

/// A logical catalog. Cluster-scoped; its Items live in the namespace of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: StoreStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStatus {}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            status: StoreStatus::default(),
        }
    }

    /// Name of the namespace holding this Store's Items.
    pub fn namespace_name(&self) -> &str {
        &self.metadata.name
    }
}

impl Resource for Store {
    const KIND: &'static str = "Store";
    const NAMESPACED: bool = false;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn copy_status_from(&mut self, other: &Self) {
        self.status = other.status.clone();
    }
}
