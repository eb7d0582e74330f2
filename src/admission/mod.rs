//! # Item Admission
//!
//! Synchronous gate in front of every caller-issued Item create and update.
//!
//! Checks run in order and the first failure wins:
//!
//! 1. **Reference validity** - `spec.copy_of` must not name the Item itself, and its
//!    target must exist and be an original. The target is read from the store actor
//!    under a deadline; a failed or slow read denies the write.
//! 2. **Override requirement** - a copy sets at least one of title, price, genre.
//! 3. **Completeness requirement** - an original sets all three.
//!
//! Deletes are always allowed.
//!
//! ```rust,ignore
//! let validator = ItemValidator::new(item_store, Duration::from_secs(2));
//! match validator.review(AdmissionRequest::create(&item)).await {
//!     AdmissionResponse::Allowed => { /* persist */ }
//!     AdmissionResponse::Denied { message } => { /* report */ }
//! }
//! ```

pub mod error;
pub mod review;
pub mod validator;

pub use error::*;
pub use review::*;
pub use validator::*;
