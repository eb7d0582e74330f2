//! Rejection reasons of the Item admission validator.

use thiserror::Error;

/// Why an Item write was denied. `Display` is the message returned to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("item cannot reference itself in spec.copyOf")]
    SelfReference,

    #[error("spec.copyOf references non-existent Item")]
    TargetNotFound,

    /// The target could not be read in time. Treated as a denial.
    #[error("failed to validate spec.copyOf reference")]
    LookupFailed,

    #[error("a copy cannot reference another copy, only originals can be copied")]
    CopyOfCopy,

    /// Existing copies of this Item would become copies of a copy.
    #[error("an Item that other Items copy cannot itself become a copy")]
    CopiedOriginal,

    #[error("an Item with copyOf must override title, price, or genre in spec")]
    MissingOverrideOnCreate,

    #[error("when spec.copyOf is set, at least one of spec.title, spec.price, or spec.genre must be set (non-zero)")]
    MissingOverrideOnUpdate,

    #[error("an Item without copyOf must have spec.title, spec.price, and spec.genre set (non-zero)")]
    Incomplete,
}
