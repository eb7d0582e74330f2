//! Admission request and response types.

use crate::model::Item;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A proposed write of an Item.
///
/// `new` is the object as it would be stored; for `Delete` it is the object being
/// removed. `old` is the stored object on `Update`.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRequest<'a> {
    pub operation: Operation,
    pub old: Option<&'a Item>,
    pub new: &'a Item,
}

impl<'a> AdmissionRequest<'a> {
    pub fn create(item: &'a Item) -> Self {
        Self {
            operation: Operation::Create,
            old: None,
            new: item,
        }
    }

    pub fn update(old: &'a Item, new: &'a Item) -> Self {
        Self {
            operation: Operation::Update,
            old: Some(old),
            new,
        }
    }

    pub fn delete(item: &'a Item) -> Self {
        Self {
            operation: Operation::Delete,
            old: Some(item),
            new: item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionResponse {
    Allowed,
    Denied { message: String },
}

impl AdmissionResponse {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionResponse::Allowed)
    }
}
