//! Resource kinds read and written by the reconciler.
//!
//! Only the fields this system reads or writes are modelled; unknown fields in
//! manifests are ignored on load.

mod apps;
mod build;
mod component;
mod image;
mod route;
mod service;
mod source;

use serde::{Deserialize, Serialize};

pub use apps::{
    Container, ContainerPort, DeploymentConfig, DeploymentConfigSpec, DeploymentTrigger,
    ImageChangeParams, PodSpec, PodTemplateMeta, PodTemplateSpec,
};
pub use build::{
    BuildConfig, BuildConfigSpec, BuildOutput, BuildSource, BuildStrategy, BuildTrigger,
    GitBuildSource, SourceBuildStrategy,
};
pub use component::{Component, ComponentSpec, ComponentStatus};
pub use image::{
    DEFAULT_TAG, ImageStream, ImageStreamSpec, ImageStreamStatus, LookupPolicy, TagReference,
};
pub use route::{Route, RoutePort, RouteSpec, RouteTargetReference};
pub use service::{Service, ServicePort, ServiceSpec};
pub use source::{GitSource, GitSourceSpec};

/// A typed pointer at another object, used by build and deployment triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectReference {
    /// Reference to an external registry image, e.g. `docker.io/library/node:20`.
    pub fn docker_image(image: impl Into<String>) -> Self {
        Self {
            kind: "DockerImage".to_string(),
            name: image.into(),
            namespace: None,
        }
    }

    /// Reference to `stream:tag` in `namespace`.
    pub fn image_stream_tag(namespace: impl Into<String>, stream: &str, tag: &str) -> Self {
        Self {
            kind: "ImageStreamTag".to_string(),
            name: format!("{stream}:{tag}"),
            namespace: Some(namespace.into()),
        }
    }
}

/// Network protocol of a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}
