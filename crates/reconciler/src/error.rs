//! Error types for the reconciler crate.

use std::fmt;

use kiln_store::{OwnershipError, StoreError};
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
///
/// Every error ends the current run; the caller's redelivery retries it.
#[derive(Debug, Error)]
pub enum Error {
    /// The component spec is unusable as written.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The referenced git source could not be read.
    #[error("git source '{name}' could not be resolved: {source}")]
    SourceResolution { name: String, source: StoreError },

    /// No shared builder stream and no configured external image for the build type.
    #[error("builder image for build type '{build_type}' not found")]
    BuilderImageNotFound { build_type: String },

    /// Store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Ownership edge could not be recorded; nothing was created.
    #[error("setting owner reference failed: {0}")]
    Ownership(#[from] OwnershipError),

    /// Reconciler configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Reconciler configuration could not be loaded.
    #[error("loading configuration failed: {0}")]
    ConfigLoad(#[from] kiln_core::Error),
}

/// Coarse classification used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Dependency,
    Transient,
    Ownership,
    Configuration,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Dependency => "dependency",
            Self::Transient => "transient",
            Self::Ownership => "ownership",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a source resolution error.
    pub fn source_resolution(name: impl Into<String>, source: StoreError) -> Self {
        Self::SourceResolution {
            name: name.into(),
            source,
        }
    }

    /// Create a builder image not found error.
    pub fn builder_image_not_found(build_type: impl Into<String>) -> Self {
        Self::BuilderImageNotFound {
            build_type: build_type.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Classify the error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Validation { .. } => ErrorClass::Validation,
            Self::SourceResolution { .. } | Self::BuilderImageNotFound { .. } => {
                ErrorClass::Dependency
            }
            Self::Store(_) => ErrorClass::Transient,
            Self::Ownership(_) => ErrorClass::Ownership,
            Self::InvalidConfig { .. } | Self::ConfigLoad(_) => ErrorClass::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use kiln_store::{ObjectKey, ResourceKind};

    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("git source reference is not provided");
        assert!(err.to_string().contains("git source reference"));

        let err = Error::builder_image_not_found("cobol");
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_store_error_is_transparent() {
        let key = ObjectKey::new(ResourceKind::Service, "dev", "web");
        let err = Error::from(StoreError::unavailable("get", "connection refused"));
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(err.to_string().contains("connection refused"));

        let err = Error::source_resolution("web-src", StoreError::not_found(key));
        assert_eq!(err.class(), ErrorClass::Dependency);
        assert!(err.to_string().contains("web-src"));
    }

    #[test]
    fn test_class_display() {
        assert_eq!(ErrorClass::Ownership.to_string(), "ownership");
        assert_eq!(
            Error::invalid_config("bad port").class(),
            ErrorClass::Configuration
        );
    }
}
