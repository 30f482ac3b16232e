use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// User-declared intent: build `git_source_ref` with the `build_type` builder and run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub metadata: ObjectMeta,
    pub spec: ComponentSpec,
    #[serde(default)]
    pub status: ComponentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Name of a `GitSource` in the component's namespace.
    #[serde(default)]
    pub git_source_ref: String,
    /// Builder label, e.g. `nodejs`.
    #[serde(default)]
    pub build_type: String,
    /// Service port; `0` selects the configured default.
    #[serde(default)]
    pub port: i32,
    /// Whether a route exposes the service outside the cluster.
    #[serde(default)]
    pub exposed: bool,
}

impl ComponentSpec {
    pub fn new(git_source_ref: impl Into<String>, build_type: impl Into<String>) -> Self {
        Self {
            git_source_ref: git_source_ref.into(),
            build_type: build_type.into(),
            port: 0,
            exposed: false,
        }
    }

    #[must_use]
    pub const fn with_port(mut self, port: i32) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn exposed(mut self, exposed: bool) -> Self {
        self.exposed = exposed;
        self
    }
}

/// Status written by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Generation last converged; empty until the first successful run.
    #[serde(default)]
    pub rev_number: String,
}

impl Component {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: ComponentSpec) -> Self {
        Self {
            metadata: ObjectMeta::named(namespace, name),
            spec,
            status: ComponentStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// The change-generation token compared against `status.rev_number`.
    pub fn generation_token(&self) -> String {
        self.metadata.generation.to_string()
    }
}
