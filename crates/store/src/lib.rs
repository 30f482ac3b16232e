//! Cluster store model for kiln.
//!
//! This crate describes the objects the reconciler reads and writes and the
//! store it talks to:
//!
//! - **Resources**: `Component`, `GitSource`, `ImageStream`, `BuildConfig`,
//!   `DeploymentConfig`, `Service`, `Route`, erased into [`Object`]
//! - **Ownership edges**: [`set_controller_reference`] stamps a controlling
//!   [`OwnerReference`] so the store's garbage collector can cascade deletes
//! - **Store**: the [`ClusterStore`] trait with distinct not-found and
//!   already-exists errors, an in-memory implementation and a tracing wrapper
//! - **Manifests**: seeding a store from a file
//!
//! # Example
//!
//! ```ignore
//! use kiln_store::{Component, ComponentSpec, InMemoryClusterStore, StoreExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryClusterStore::new();
//!     let component = Component::new("dev", "web", ComponentSpec::new("web-src", "nodejs"));
//!     let stored = store.create_as(component).await.unwrap();
//!     println!("uid: {:?}", stored.metadata.uid);
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod manifest;
pub mod meta;
pub mod object;
pub mod ownership;
pub mod resources;
pub mod store;

// Re-export main types
pub use error::{OwnershipError, Result, StoreError};
pub use manifest::{apply_objects, load_manifest};
pub use meta::{
    APP_LABEL, MANAGED_BY, MANAGED_BY_LABEL, ObjectKey, ObjectMeta, OwnerReference, ResourceKind,
};
pub use object::{Object, Resource};
pub use ownership::{controller_reference, is_controlled_by, set_controller_reference};
pub use resources::*;
pub use store::{
    ClusterStore, InMemoryClusterStore, OperationCounts, StoreEvent, StoreExt, TracingClusterStore,
};
