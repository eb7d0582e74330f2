//! # Object Identity & Metadata
//!
//! Every resource kind managed by a [`ResourceActor`](crate::framework::ResourceActor)
//! carries an [`ObjectMeta`]. The store owns the system fields (`uid`,
//! `resource_version`, `deletion_timestamp`); callers and reconcilers own the rest.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::SystemTime;

/// Identity of an object inside one store: `(namespace, name)`.
///
/// Cluster-scoped kinds use the empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_cluster_scoped() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Points from a dependent object to the object that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

/// Metadata shared by all resource kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Assigned by the store on create.
    #[serde(default)]
    pub uid: String,
    /// Bumped by the store on every write. Updates must echo the current value.
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default)]
    pub finalizers: Vec<String>,
    /// Set once by the store when deletion is requested while finalizers remain.
    #[serde(default)]
    pub deletion_timestamp: Option<SystemTime>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::namespaced(self.namespace.clone(), self.name.clone())
    }

    pub fn is_deletion_requested(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Adds `finalizer` unless already present. Returns whether the set changed.
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.finalizers.push(finalizer.to_string());
        true
    }

    /// Removes `finalizer` if present. Returns whether the set changed.
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        self.finalizers.len() != before
    }

    /// Replaces any owner reference of the same kind with `owner`.
    pub fn set_owner_reference(&mut self, owner: OwnerReference) {
        self.owner_references.retain(|r| r.kind != owner.kind);
        self.owner_references.push(owner);
    }
}
