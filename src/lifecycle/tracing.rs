//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter whose level
//! comes from `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Store actors**: every request, with `kind` and `key`
//! - **Controllers**: start and stop, each reconcile outcome, retries with their delay
//! - **Reconcilers**: finalizer added or removed, namespace created, Items deleted,
//!   copy count changes (inside a `reconcile{controller=.. key=..}` span)
//! - **Admission**: every review with its operation, key and verdict
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle transitions only
//! RUST_LOG=info cargo run
//!
//! # Every store request, with payloads
//! RUST_LOG=debug cargo run
//! ```
//!
//! **With `RUST_LOG=info`**, deleting a Store reads:
//!
//! ```text
//! INFO Deletion requested kind="Store" key=downtown finalizers=["catalog.example.com/finalizer"]
//! INFO reconcile: Store is being deleted, running cleanup controller="store" key=downtown namespace=downtown
//! INFO reconcile: Deleted Item in store namespace key=downtown/dune
//! INFO reconcile: Finalizer removed controller="store" key=downtown deleted=1
//! INFO Finalizers cleared, erased kind="Store" key=downtown size=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Module paths add nothing; lines carry kind/controller fields
        .compact()
        .init();
}
