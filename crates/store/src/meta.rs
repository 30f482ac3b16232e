//! Object metadata, keys and ownership edges shared by every resource kind.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label carrying the owning component's name on every derived object.
pub const APP_LABEL: &str = "app";

/// Label marking objects created by this controller.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_LABEL`].
pub const MANAGED_BY: &str = "kiln";

/// The resource kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Component,
    GitSource,
    ImageStream,
    BuildConfig,
    DeploymentConfig,
    Service,
    Route,
}

impl ResourceKind {
    /// All kinds, in creation order of a converged component.
    pub const ALL: [Self; 7] = [
        Self::Component,
        Self::GitSource,
        Self::ImageStream,
        Self::BuildConfig,
        Self::DeploymentConfig,
        Self::Service,
        Self::Route,
    ];

    /// API group/version the kind is served under.
    pub const fn api_version(self) -> &'static str {
        match self {
            Self::Component | Self::GitSource => "devconsole.openshift.io/v1alpha1",
            Self::ImageStream => "image.openshift.io/v1",
            Self::BuildConfig => "build.openshift.io/v1",
            Self::DeploymentConfig => "apps.openshift.io/v1",
            Self::Service => "v1",
            Self::Route => "route.openshift.io/v1",
        }
    }

    /// Kind name as it appears in manifests and owner references.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Component => "Component",
            Self::GitSource => "GitSource",
            Self::ImageStream => "ImageStream",
            Self::BuildConfig => "BuildConfig",
            Self::DeploymentConfig => "DeploymentConfig",
            Self::Service => "Service",
            Self::Route => "Route",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A controlling or non-controlling reference from a dependent to its owner.
///
/// The store's garbage collector deletes a dependent once every owner it
/// references is gone. This crate only ever records the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

impl OwnerReference {
    /// Whether this reference marks the controlling owner.
    pub fn is_controller(&self) -> bool {
        self.controller.unwrap_or(false)
    }
}

/// Standard object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default)]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    /// Metadata for a new object with just a name and namespace.
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Add a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Whether the object has been marked for deletion.
    pub const fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    /// The controlling owner reference, if any.
    pub fn controller(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.is_controller())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_display() {
        let key = ObjectKey::new(ResourceKind::Route, "dev", "web");
        assert_eq!(key.to_string(), "Route/dev/web");
    }

    #[test]
    fn test_meta_controller_lookup() {
        let mut meta = ObjectMeta::named("dev", "web");
        assert!(meta.controller().is_none());

        meta.owner_references.push(OwnerReference {
            api_version: "v1".to_string(),
            kind: "Thing".to_string(),
            name: "other".to_string(),
            uid: "u1".to_string(),
            controller: None,
            block_owner_deletion: None,
        });
        assert!(meta.controller().is_none());

        meta.owner_references.push(OwnerReference {
            api_version: "v1".to_string(),
            kind: "Component".to_string(),
            name: "web".to_string(),
            uid: "u2".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        });
        assert_eq!(meta.controller().map(|r| r.uid.as_str()), Some("u2"));
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = ObjectMeta::named("dev", "web").with_label(APP_LABEL, "web");
        let json = serde_json::to_value(&meta).ok();
        let labels = json
            .as_ref()
            .and_then(|v| v.get("labels"))
            .and_then(|l| l.get("app"))
            .and_then(|a| a.as_str());
        assert_eq!(labels, Some("web"));
        assert!(json.as_ref().and_then(|v| v.get("ownerReferences")).is_none());
    }
}
