//! Manifests: documents listing objects to seed a store with.
//!
//! A manifest is either a bare list of `kind`-tagged objects or a map with an
//! `items` list, in JSON, YAML or TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::object::Object;
use crate::store::ClusterStore;

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum ManifestDocument {
    List { items: Vec<Object> },
    Bare(Vec<Object>),
}

impl From<ManifestDocument> for Vec<Object> {
    fn from(document: ManifestDocument) -> Self {
        match document {
            ManifestDocument::List { items } | ManifestDocument::Bare(items) => items,
        }
    }
}

/// Read the objects listed in a manifest file.
///
/// # Errors
///
/// Returns a [`kiln_core::Error`] if the file cannot be read or parsed.
pub fn load_manifest(path: &Path) -> kiln_core::Result<Vec<Object>> {
    let document: ManifestDocument = kiln_core::read_document(path)?;
    let objects: Vec<Object> = document.into();
    tracing::debug!(path = %path.display(), objects = objects.len(), "Loaded manifest");
    Ok(objects)
}

/// Create every object in `objects`, in order. Returns the created copies.
///
/// # Errors
///
/// Stops at and returns the first store error.
pub async fn apply_objects(store: &dyn ClusterStore, objects: Vec<Object>) -> Result<Vec<Object>> {
    let mut created = Vec::with_capacity(objects.len());
    for object in objects {
        let key = object.key();
        let stored = store.create(object).await?;
        tracing::debug!(key = %key, "Seeded object");
        created.push(stored);
    }
    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::meta::ResourceKind;
    use crate::store::InMemoryClusterStore;

    const MANIFEST: &str = r"
items:
  - kind: GitSource
    metadata:
      name: web-src
      namespace: dev
    spec:
      url: https://github.com/example/web.git
      ref: main
  - kind: Component
    metadata:
      name: web
      namespace: dev
    spec:
      gitSourceRef: web-src
      buildType: nodejs
      exposed: true
";

    fn write_manifest(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_items_manifest() {
        let file = write_manifest(".yaml", MANIFEST);

        let objects = load_manifest(file.path()).unwrap();

        let kinds: Vec<ResourceKind> = objects.iter().map(Object::kind).collect();
        assert_eq!(kinds, vec![ResourceKind::GitSource, ResourceKind::Component]);
    }

    #[test]
    fn test_load_bare_list_manifest() {
        let body = r"
- kind: GitSource
  metadata: { name: src, namespace: dev }
  spec: { url: https://example.com/x.git }
";
        let file = write_manifest(".yml", body);

        let objects = load_manifest(file.path()).unwrap();

        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_load_rejects_unknown_kind() {
        let body = "- kind: Pod\n  metadata: { name: x, namespace: dev }\n";
        let file = write_manifest(".yaml", body);

        assert!(load_manifest(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_apply_objects_seeds_store() {
        let file = write_manifest(".yaml", MANIFEST);
        let store = InMemoryClusterStore::new();

        let created = apply_objects(&store, load_manifest(file.path()).unwrap())
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|o| o.meta().uid.is_some()));
        assert_eq!(store.len().await, 2);
    }
}
