use crate::framework::{ObjectMeta, Resource};
use serde::{Deserialize, Serialize};

/// A cluster-scoped namespace. The Store reconciler creates one per Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
        }
    }
}

impl Resource for Namespace {
    const KIND: &'static str = "Namespace";
    const NAMESPACED: bool = false;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
