//! An entry in a Store's catalog.
//!
//! An Item is either an **original**, which must carry a complete spec, or a **copy**
//! of an original (`spec.copy_of` set), which overrides at least one field of it.
//! Originals track how many copies point at them in `status.copy_count`.
use crate::framework::{ObjectKey, ObjectMeta, Resource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub metadata: ObjectMeta,
    pub spec: ItemSpec,
    #[serde(default)]
    pub status: ItemStatus,
}

/// Declared fields. An empty string means "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_of: Option<CopyReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatus {
    /// Number of Items whose `copy_of` names this one. Unused on copies.
    #[serde(default)]
    pub copy_count: u32,
}

/// Lookup key for the original an Item copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyReference {
    pub namespace: String,
    pub name: String,
}

impl CopyReference {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::namespaced(self.namespace.clone(), self.name.clone())
    }

    /// Both parts set.
    pub fn is_complete(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }

    pub fn points_at(&self, key: &ObjectKey) -> bool {
        self.namespace == key.namespace && self.name == key.name
    }
}

impl ItemSpec {
    pub fn has_any_field(&self) -> bool {
        !self.title.is_empty() || !self.price.is_empty() || !self.genre.is_empty()
    }

    pub fn has_all_fields(&self) -> bool {
        !self.title.is_empty() && !self.price.is_empty() && !self.genre.is_empty()
    }
}

impl Item {
    /// An original with all three fields set.
    pub fn original(
        namespace: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
        price: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            spec: ItemSpec {
                title: title.into(),
                price: price.into(),
                genre: genre.into(),
                copy_of: None,
            },
            status: ItemStatus::default(),
        }
    }

    /// A copy of `of` with no overrides yet.
    pub fn copy(namespace: impl Into<String>, name: impl Into<String>, of: CopyReference) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            spec: ItemSpec {
                copy_of: Some(of),
                ..ItemSpec::default()
            },
            status: ItemStatus::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.spec.title = title.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.spec.price = price.into();
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.spec.genre = genre.into();
        self
    }

    pub fn is_copy(&self) -> bool {
        self.spec.copy_of.is_some()
    }

    pub fn is_original(&self) -> bool {
        !self.is_copy()
    }
}

impl Resource for Item {
    const KIND: &'static str = "Item";
    const NAMESPACED: bool = true;

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
