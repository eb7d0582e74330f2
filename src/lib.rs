//! # Catalog Operator
//!
//! > **Stores, Items and the control loops that keep them consistent.**
//!
//! A small declarative control plane for two resource kinds: a **Store** (a catalog,
//! cluster-scoped) and an **Item** (an entry in a Store's namespace, optionally a copy
//! of another Item). Callers declare what they want; reconcilers converge on it.
//!
//! ## 🏗️ Design
//!
//! ### Actors as the Store
//! Every kind lives in its own [`ResourceActor`](framework::ResourceActor). Requests are
//! processed sequentially, so there are no locks; writers race through
//! `resource_version` instead and the loser retries.
//!
//! ### Level-Triggered Control Loops
//! Reconcilers receive only a key. They read current state, compute the delta and write
//! it back, so a dropped or duplicated event never matters: the next pass converges.
//!
//! ### Finalizer-Gated Deletion
//! A Store is erased only after its dependent Items are gone. Deleting it just marks it;
//! the Store reconciler performs the cascade and then releases its finalizer.
//!
//! ### Admission in the Write Path
//! Item creates and updates pass through [`ItemValidator`](admission::ItemValidator)
//! before they reach the store. Reconciler writes do not.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Store actor, typed clients, controller runtime, mocks.
//! - **Key items**: [`ResourceActor`](framework::ResourceActor), [`Controller`](framework::Controller),
//!   [`Reconciler`](framework::Reconciler).
//!
//! ### 2. The Kinds ([`model`])
//! - **Key items**: [`Item`](model::Item), [`Store`](model::Store), [`Namespace`](model::Namespace).
//!
//! ### 3. The Control Loops ([`item_controller`], [`store_controller`])
//! - **Item**: keeps `status.copy_count` on originals exact.
//! - **Store**: finalizer, companion namespace, cascade delete.
//!
//! ### 4. The Gate ([`admission`])
//! - **Role**: Referential integrity of `spec.copy_of` and required fields.
//!
//! ### 5. The Interface ([`clients`]) and the Orchestrator ([`lifecycle`])
//! - **Key items**: [`ItemClient`](clients::ItemClient), [`OperatorSystem`](lifecycle::OperatorSystem).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! CATALOG_OPERATOR_CONFIG=operator.toml RUST_LOG=debug cargo run
//! ```

pub mod admission;
pub mod clients;
pub mod config;
pub mod framework;
pub mod item_controller;
pub mod lifecycle;
pub mod model;
pub mod store_controller;
