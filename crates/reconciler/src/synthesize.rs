//! Pure construction of the descriptors derived from a component.
//!
//! Nothing here touches the store. Every derived object lives in the
//! component's namespace, is named from the component's name and carries the
//! component's labels.

use std::collections::BTreeMap;

use kiln_store::{
    APP_LABEL, BuildConfig, BuildConfigSpec, BuildOutput, BuildSource, BuildStrategy,
    BuildTrigger, Component, Container, ContainerPort, DEFAULT_TAG, DeploymentConfig,
    DeploymentConfigSpec, DeploymentTrigger, GitBuildSource, GitSource, ImageChangeParams,
    ImageStream, ImageStreamSpec, ImageStreamStatus, LookupPolicy, MANAGED_BY, MANAGED_BY_LABEL, ObjectMeta,
    ObjectReference, PodSpec, PodTemplateMeta, PodTemplateSpec, Protocol, Route, RoutePort,
    RouteSpec, RouteTargetReference, Service, ServicePort, ServiceSpec, SourceBuildStrategy,
    TagReference,
};

use crate::config::{MAX_PORT, ReconcilerConfig};
use crate::error::{Error, Result};

/// Pod label selecting a deployment's pods.
pub const DEPLOYMENT_LABEL: &str = "deploymentconfig";

/// Annotation recording which external image a synthesized builder stream tracks.
pub const IMPORTED_FROM_ANNOTATION: &str = "openshift.io/imported-from";

/// Builds derived descriptors for components.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSynthesizer<'a> {
    config: &'a ReconcilerConfig,
}

impl<'a> ResourceSynthesizer<'a> {
    /// Synthesizer using the defaults in `config`.
    pub const fn new(config: &'a ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Labels shared by every derived object.
    pub fn labels(component: &Component) -> BTreeMap<String, String> {
        BTreeMap::from([
            (APP_LABEL.to_string(), component.name().to_string()),
            (MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string()),
        ])
    }

    fn meta(component: &Component, name: impl Into<String>) -> ObjectMeta {
        ObjectMeta {
            labels: Self::labels(component),
            ..ObjectMeta::named(component.namespace(), name)
        }
    }

    /// Name of the builder stream synthesized for a component.
    pub fn builder_stream_name(component: &Component) -> String {
        format!("{}-builder", component.name())
    }

    /// Empty stream the build pipeline publishes into.
    pub fn output_image_stream(component: &Component) -> ImageStream {
        ImageStream::empty(Self::meta(component, component.name()))
    }

    /// Builder stream tracking an external registry image.
    pub fn builder_image_stream(component: &Component, external_image: &str) -> ImageStream {
        let mut meta = Self::meta(component, Self::builder_stream_name(component));
        meta.annotations.insert(
            IMPORTED_FROM_ANNOTATION.to_string(),
            external_image.to_string(),
        );

        ImageStream {
            metadata: meta,
            spec: ImageStreamSpec {
                lookup_policy: LookupPolicy { local: false },
                tags: vec![TagReference {
                    name: DEFAULT_TAG.to_string(),
                    from: Some(ObjectReference::docker_image(external_image)),
                }],
            },
            status: ImageStreamStatus::default(),
        }
    }

    /// Source-to-image build from `git_source` onto `builder`, publishing into the output stream.
    pub fn build_config(
        component: &Component,
        git_source: &GitSource,
        builder: ObjectReference,
    ) -> BuildConfig {
        BuildConfig {
            metadata: Self::meta(component, component.name()),
            spec: BuildConfigSpec {
                source: BuildSource {
                    git: Some(GitBuildSource {
                        uri: git_source.spec.url.clone(),
                        reference: git_source.spec.reference.clone(),
                    }),
                    context_dir: git_source.spec.context_dir.clone(),
                },
                strategy: BuildStrategy::Source {
                    source_strategy: SourceBuildStrategy {
                        from: builder,
                        incremental: false,
                    },
                },
                output: BuildOutput {
                    to: Self::output_tag(component),
                },
                triggers: vec![BuildTrigger::ConfigChange, BuildTrigger::ImageChange],
            },
        }
    }

    /// The port the component's service listens on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the port is negative or above 65535.
    pub fn service_port(&self, component: &Component) -> Result<i32> {
        let port = match component.spec.port {
            0 => self.config.default_port,
            port => port,
        };
        if (1..=MAX_PORT).contains(&port) {
            Ok(port)
        } else {
            Err(Error::validation(format!(
                "port {port} of component '{}' is outside 1..={MAX_PORT}",
                component.name()
            )))
        }
    }

    /// Single-replica workload running the output stream's image.
    pub fn deployment_config(component: &Component, output: &ImageStream, port: i32) -> DeploymentConfig {
        let name = component.name().to_string();
        let image = output.status.docker_image_repository.as_ref().map_or_else(
            || format!("{}:{DEFAULT_TAG}", output.metadata.name),
            |repository| format!("{repository}:{DEFAULT_TAG}"),
        );

        let mut pod_labels = Self::labels(component);
        pod_labels.insert(DEPLOYMENT_LABEL.to_string(), name.clone());

        DeploymentConfig {
            metadata: Self::meta(component, name.clone()),
            spec: DeploymentConfigSpec {
                replicas: 1,
                selector: BTreeMap::from([
                    (APP_LABEL.to_string(), name.clone()),
                    (DEPLOYMENT_LABEL.to_string(), name.clone()),
                ]),
                template: PodTemplateSpec {
                    metadata: PodTemplateMeta { labels: pod_labels },
                    spec: PodSpec {
                        containers: vec![Container {
                            name: name.clone(),
                            image,
                            ports: vec![ContainerPort {
                                container_port: port,
                                protocol: Protocol::Tcp,
                            }],
                        }],
                    },
                },
                triggers: vec![
                    DeploymentTrigger::ConfigChange,
                    DeploymentTrigger::ImageChange {
                        image_change_params: ImageChangeParams {
                            automatic: true,
                            container_names: vec![name],
                            from: ObjectReference::image_stream_tag(
                                output.metadata.namespace.clone(),
                                &output.metadata.name,
                                DEFAULT_TAG,
                            ),
                        },
                    },
                ],
            },
        }
    }

    /// In-cluster endpoint selecting the component's pods by its `app` label.
    pub fn service(component: &Component, port: i32) -> Service {
        Service {
            metadata: Self::meta(component, component.name()),
            spec: ServiceSpec {
                selector: BTreeMap::from([(APP_LABEL.to_string(), component.name().to_string())]),
                ports: vec![ServicePort {
                    name: format!("{port}-tcp"),
                    port,
                    target_port: port,
                    protocol: Protocol::Tcp,
                }],
            },
        }
    }

    /// Route exposing `service`, or `None` when the component is not exposed.
    pub fn route(component: &Component, service: &Service) -> Option<Route> {
        component.spec.exposed.then(|| Route {
            metadata: Self::meta(component, component.name()),
            spec: RouteSpec {
                host: None,
                to: RouteTargetReference {
                    kind: "Service".to_string(),
                    name: service.metadata.name.clone(),
                },
                port: service.spec.ports.first().map(|p| RoutePort {
                    target_port: p.target_port,
                }),
            },
        })
    }

    fn output_tag(component: &Component) -> ObjectReference {
        ObjectReference::image_stream_tag(component.namespace(), component.name(), DEFAULT_TAG)
    }
}
