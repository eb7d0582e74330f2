//! Resource kinds held by the store actors.
//!
//! Each kind implements [`Resource`](crate::framework::Resource) and serializes with
//! camelCase field names.

pub mod item;
pub mod namespace;
pub mod store;

pub use item::*;
pub use namespace::*;
pub use store::*;
