//! Idempotent "ensure exists" against the cluster store.
//!
//! Each call stamps the owning component onto the desired object, reads the
//! object by key, and creates it only when the read reports not-found. Calls
//! are independent, so a sequence of them resumes where a failed run stopped.

use kiln_core::GenericResultExt;
use kiln_store::{
    ClusterStore, Component, ObjectKey, OwnershipError, Resource, StoreError, StoreExt,
    is_controlled_by, set_controller_reference,
};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::types::{EnsureAction, EnsureRecord};

/// Outcome of ensuring one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured<R> {
    /// The object was created by this call.
    Created(R),
    /// The object already existed and is returned as read.
    Existing(R),
}

impl<R: Resource> Ensured<R> {
    /// Take the object, created or found.
    pub fn into_inner(self) -> R {
        match self {
            Self::Created(r) | Self::Existing(r) => r,
        }
    }

    /// Borrow the object.
    pub const fn get(&self) -> &R {
        match self {
            Self::Created(r) | Self::Existing(r) => r,
        }
    }

    /// Whether this call created the object.
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Report entry for this outcome.
    pub fn record(&self) -> EnsureRecord {
        let action = if self.was_created() {
            EnsureAction::Created
        } else {
            EnsureAction::Existing
        };
        EnsureRecord::new(self.get().key(), action)
    }
}

/// Ensures derived objects exist, owned by one component.
pub struct Materializer<'a> {
    store: &'a dyn ClusterStore,
    owner: &'a Component,
}

impl<'a> Materializer<'a> {
    /// Materializer writing to `store` on behalf of `owner`.
    pub const fn new(store: &'a dyn ClusterStore, owner: &'a Component) -> Self {
        Self { store, owner }
    }

    /// Make sure `desired` exists, owned by the component.
    ///
    /// Existing objects are returned untouched; drift is not corrected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ownership`](crate::Error::Ownership) if the ownership
    /// edge cannot be stamped (nothing is created) or the object found under
    /// the key is controlled by another owner, or the store error of any
    /// read or create other than not-found.
    pub async fn ensure_exists<R: Resource>(&self, mut desired: R) -> Result<Ensured<R>> {
        let key = desired.key();

        set_controller_reference(self.owner, desired.meta_mut()).tap_err(|e| {
            error!(key = %key, owner = self.owner.name(), error = %e, "Setting owner reference failed");
        })?;

        match self.read::<R>(&key).await {
            Ok(found) => return self.existing(&key, found),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Reading object failed");
                return Err(e.into());
            }
        }

        info!(key = %key, owner = self.owner.name(), "Creating object");
        match self.store.create_as(desired).await {
            Ok(created) => Ok(Ensured::Created(created)),
            Err(e) if e.is_already_exists() => {
                // Lost a race with another writer; what is stored now is the answer.
                debug!(key = %key, "Object appeared concurrently, re-reading");
                let found = self.read::<R>(&key).await.tap_err(|e| {
                    warn!(key = %key, error = %e, "Re-reading object after conflict failed");
                })?;
                self.existing(&key, found)
            }
            Err(e) => {
                error!(key = %key, error = %e, "Creating object failed");
                Err(e.into())
            }
        }
    }

    async fn read<R: Resource>(&self, key: &ObjectKey) -> std::result::Result<R, StoreError> {
        self.store.get_as::<R>(&key.namespace, &key.name).await
    }

    /// Accept a found object unless another owner controls it.
    fn existing<R: Resource>(&self, key: &ObjectKey, found: R) -> Result<Ensured<R>> {
        match found.meta().controller() {
            Some(_) if is_controlled_by(found.meta(), self.owner) => {
                debug!(key = %key, "Skip creating: already exists");
            }
            Some(controller) => {
                error!(
                    key = %key,
                    owner = self.owner.name(),
                    controller = %controller.name,
                    "Object is controlled by another owner"
                );
                return Err(OwnershipError::AlreadyOwned {
                    dependent: key.to_string(),
                    kind: controller.kind.clone(),
                    name: controller.name.clone(),
                }
                .into());
            }
            None => warn!(
                key = %key,
                owner = self.owner.name(),
                "Object exists without a controller; leaving it as is"
            ),
        }
        Ok(Ensured::Existing(found))
    }
}
