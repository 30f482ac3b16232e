//! K8s-style reconciliation of Components.
//!
//! A Component names a git source and a build type. Reconciling it converges
//! the store toward a fixed set of derived objects:
//!
//! - **ImageStream** receiving the build output
//! - **ImageStream** for the builder, unless a shared one exists
//! - **BuildConfig** building the source with the builder
//! - **DeploymentConfig** running the built image
//! - **Service** exposing the workload port
//! - **Route** when the component is exposed
//!
//! # Key Concepts
//!
//! ## Revision gate
//!
//! A run is admitted only when the component's recorded revision differs from
//! its generation. A converged generation costs one read.
//!
//! ## Get-or-create
//!
//! Derived objects are created once and never updated. A run that fails half
//! way is resumed by the next one, which finds what already exists.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use kiln_reconciler::{ComponentReconciler, LoopConfig, ReconcilerConfig, ReconciliationLoop};
//! use kiln_store::{ClusterStore, InMemoryClusterStore};
//!
//! #[tokio::main]
//! async fn main() -> kiln_reconciler::Result<()> {
//!     let store = InMemoryClusterStore::new_arc();
//!     let reconciler = ComponentReconciler::new(store.clone(), ReconcilerConfig::default())
//!         .map(Arc::new)?;
//!
//!     let loop_runner = ReconciliationLoop::new(reconciler, LoopConfig::default())
//!         .watch(store.subscribe());
//!     let stopper = loop_runner.stopper();
//!
//!     // Run until stopped
//!     // let stats = loop_runner.run().await;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod gate;
pub mod r#loop;
pub mod materialize;
pub mod reconciler;
pub mod resolve;
pub mod synthesize;
pub mod types;

// Re-export main types
pub use config::ReconcilerConfig;
pub use error::{Error, ErrorClass, Result};
pub use gate::GateDecision;
pub use r#loop::{LoopConfig, LoopHandle, LoopStats, LoopStopper, ReconciliationLoop};
pub use materialize::{Ensured, Materializer};
pub use reconciler::{ComponentReconciler, ReconcilerBuilder};
pub use resolve::{BuilderImage, BuilderImageResolver};
pub use synthesize::ResourceSynthesizer;
pub use types::{ComponentKey, ConvergenceReport, EnsureAction, EnsureRecord, ReconcileOutcome};
