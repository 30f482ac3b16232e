//! Error types for the store crate.

use thiserror::Error;

use crate::meta::{ObjectKey, ResourceKind};

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by a [`ClusterStore`](crate::store::ClusterStore).
///
/// `NotFound` and `AlreadyExists` are distinct from every other failure so
/// callers can branch on them; everything else is treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{key} not found")]
    NotFound { key: ObjectKey },

    #[error("{key} already exists")]
    AlreadyExists { key: ObjectKey },

    #[error("store operation '{operation}' failed: {reason}")]
    Unavailable { operation: String, reason: String },

    #[error("expected object of kind {expected}, got {actual}")]
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("invalid object: {reason}")]
    Invalid { reason: String },
}

impl StoreError {
    /// Create a not found error.
    pub const fn not_found(key: ObjectKey) -> Self {
        Self::NotFound { key }
    }

    /// Create an already exists error.
    pub const fn already_exists(key: ObjectKey) -> Self {
        Self::AlreadyExists { key }
    }

    /// Create an unavailable error.
    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid object error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Whether the error reports a missing object.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error reports a create conflict.
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Failures while recording an ownership edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error("owner {kind} '{name}' has no uid; it must be read from the store first")]
    OwnerWithoutUid { kind: String, name: String },

    #[error(
        "cross-namespace owner references are disallowed: owner '{owner_namespace}', dependent '{dependent_namespace}'"
    )]
    CrossNamespace {
        owner_namespace: String,
        dependent_namespace: String,
    },

    #[error("object '{dependent}' is already controlled by {kind} '{name}'")]
    AlreadyOwned {
        dependent: String,
        kind: String,
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let key = ObjectKey::new(ResourceKind::Service, "dev", "web");
        assert!(StoreError::not_found(key.clone()).is_not_found());
        assert!(!StoreError::not_found(key.clone()).is_already_exists());
        assert!(StoreError::already_exists(key).is_already_exists());
        assert!(!StoreError::unavailable("get", "timeout").is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::unavailable("create", "connection reset");
        assert!(err.to_string().contains("create"));
        assert!(err.to_string().contains("connection reset"));

        let key = ObjectKey::new(ResourceKind::Route, "dev", "web");
        assert_eq!(StoreError::not_found(key).to_string(), "Route/dev/web not found");
    }
}
