//! # Store & Controller Framework
//!
//! Building blocks for a small declarative control plane: a per-kind store actor with
//! optimistic concurrency and finalizers, and a controller runtime that turns store
//! change events into reconcile calls.
//!
//! ## Architecture Overview
//!
//! 1. **Resource Layer** ([`Resource`], [`ObjectMeta`]) - What a kind must expose to be stored
//! 2. **Store Layer** ([`ResourceActor`]) - One actor per kind owns every object of that kind
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - Type-safe message passing
//! 4. **Control Layer** ([`Controller`], [`Reconciler`]) - Watch, queue, reconcile, retry
//!
//! ## Concurrency Model
//!
//! - Each store actor runs in its own Tokio task and applies writes sequentially
//! - Writers race through `resource_version`; the loser gets [`StoreError::Conflict`]
//! - Reconciles for distinct keys run in parallel, a single key never twice at once
//!
//! ## Testing
//!
//! See the [`mock`] module for scripting store replies without spawning actors.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod controller;
pub mod error;
pub mod message;
pub mod meta;
pub mod mock;
pub mod resource;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use controller::{Action, Backoff, Controller, Reconciler, WorkQueue};
pub use error::StoreError;
pub use message::{ResourceRequest, Response, WatchEvent};
pub use meta::{ObjectKey, ObjectMeta, OwnerReference};
pub use resource::Resource;
