use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Location of a component's source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    pub metadata: ObjectMeta,
    pub spec: GitSourceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSourceSpec {
    pub url: String,
    /// Branch, tag or commit to build.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Sub-directory holding the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<String>,
}

impl GitSource {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(namespace, name),
            spec: GitSourceSpec {
                url: url.into(),
                reference: None,
                context_dir: None,
            },
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.spec.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_context_dir(mut self, dir: impl Into<String>) -> Self {
        self.spec.context_dir = Some(dir.into());
        self
    }
}
