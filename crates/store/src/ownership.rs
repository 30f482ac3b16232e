//! Ownership edges.
//!
//! A dependent carrying a controlling [`OwnerReference`] to its owner is removed by
//! the store's garbage collector when the owner goes away. Only the edge is
//! written here; cascading deletion happens elsewhere.

use crate::error::OwnershipError;
use crate::meta::{ObjectMeta, OwnerReference};
use crate::object::Resource;

/// Build a controlling owner reference pointing at `owner`.
///
/// # Errors
///
/// Returns [`OwnershipError::OwnerWithoutUid`] if the owner was never persisted.
pub fn controller_reference<R: Resource>(owner: &R) -> Result<OwnerReference, OwnershipError> {
    let meta = owner.meta();
    let uid = meta
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| OwnershipError::OwnerWithoutUid {
            kind: R::KIND.to_string(),
            name: meta.name.clone(),
        })?;

    Ok(OwnerReference {
        api_version: R::KIND.api_version().to_string(),
        kind: R::KIND.to_string(),
        name: meta.name.clone(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Stamp `owner` as the controlling owner of `dependent`.
///
/// Re-stamping the same owner is a no-op, so the call is safe to repeat.
///
/// # Errors
///
/// Fails when the owner has no uid, when owner and dependent live in different
/// namespaces, or when `dependent` is already controlled by someone else.
pub fn set_controller_reference<R: Resource>(
    owner: &R,
    dependent: &mut ObjectMeta,
) -> Result<(), OwnershipError> {
    let reference = controller_reference(owner)?;
    let owner_namespace = &owner.meta().namespace;

    if !dependent.namespace.is_empty() && dependent.namespace != *owner_namespace {
        return Err(OwnershipError::CrossNamespace {
            owner_namespace: owner_namespace.clone(),
            dependent_namespace: dependent.namespace.clone(),
        });
    }

    if let Some(existing) = dependent.controller() {
        if existing.uid != reference.uid {
            return Err(OwnershipError::AlreadyOwned {
                dependent: dependent.name.clone(),
                kind: existing.kind.clone(),
                name: existing.name.clone(),
            });
        }
    }

    dependent.owner_references.retain(|r| r.uid != reference.uid);
    dependent.owner_references.push(reference);
    Ok(())
}

/// Whether `dependent` is controlled by `owner`.
pub fn is_controlled_by<R: Resource>(dependent: &ObjectMeta, owner: &R) -> bool {
    match (dependent.controller(), owner.meta().uid.as_deref()) {
        (Some(controller), Some(uid)) => controller.uid == uid,
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::{Component, ComponentSpec};

    fn owner(uid: Option<&str>) -> Component {
        let mut component = Component::new("dev", "web", ComponentSpec::new("web-src", "nodejs"));
        component.metadata.uid = uid.map(String::from);
        component
    }

    #[test]
    fn test_set_controller_reference_stamps_edge() {
        let owner = owner(Some("uid-1"));
        let mut dependent = ObjectMeta::named("dev", "web");

        set_controller_reference(&owner, &mut dependent).unwrap();

        let edge = dependent.controller().unwrap();
        assert_eq!(edge.kind, "Component");
        assert_eq!(edge.name, "web");
        assert_eq!(edge.uid, "uid-1");
        assert_eq!(edge.api_version, "devconsole.openshift.io/v1alpha1");
        assert_eq!(edge.block_owner_deletion, Some(true));
        assert!(is_controlled_by(&dependent, &owner));
    }

    #[test]
    fn test_set_controller_reference_is_idempotent() {
        let owner = owner(Some("uid-1"));
        let mut dependent = ObjectMeta::named("dev", "web");

        set_controller_reference(&owner, &mut dependent).unwrap();
        set_controller_reference(&owner, &mut dependent).unwrap();

        assert_eq!(dependent.owner_references.len(), 1);
    }

    #[test]
    fn test_owner_without_uid_is_rejected() {
        let owner = owner(None);
        let mut dependent = ObjectMeta::named("dev", "web");

        let result = set_controller_reference(&owner, &mut dependent);

        assert!(matches!(result, Err(OwnershipError::OwnerWithoutUid { .. })));
        assert!(dependent.owner_references.is_empty());
    }

    #[test]
    fn test_cross_namespace_is_rejected() {
        let owner = owner(Some("uid-1"));
        let mut dependent = ObjectMeta::named("openshift", "nodejs");

        let result = set_controller_reference(&owner, &mut dependent);

        assert!(matches!(result, Err(OwnershipError::CrossNamespace { .. })));
    }

    #[test]
    fn test_foreign_controller_is_rejected() {
        let first = owner(Some("uid-1"));
        let second = owner(Some("uid-2"));
        let mut dependent = ObjectMeta::named("dev", "web");

        set_controller_reference(&first, &mut dependent).unwrap();
        let result = set_controller_reference(&second, &mut dependent);

        assert!(matches!(result, Err(OwnershipError::AlreadyOwned { .. })));
        assert!(!is_controlled_by(&dependent, &second));
    }
}
