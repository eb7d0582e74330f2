//! Kind-specific clients for callers outside the control loops.
//!
//! [`ItemClient`] routes creates and updates through admission before they reach the
//! store actor. Both clients inherit `get`, `list` and `delete` from
//! [`ActorClient`](crate::framework::ActorClient).

pub mod error;
pub mod item_client;
pub mod store_client;

pub use error::ClientError;
pub use item_client::ItemClient;
pub use store_client::StoreClient;
