//! Builder image resolution.
//!
//! A stream named after the build type in the shared system namespace wins and
//! is used as is. Otherwise the configured external image for the build type is
//! wrapped in a stream owned by the component.

use kiln_store::{ClusterStore, Component, ImageStream, ObjectReference, Resource, StoreExt};
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::materialize::{Ensured, Materializer};
use crate::synthesize::ResourceSynthesizer;
use crate::types::{EnsureAction, EnsureRecord};

/// The builder image a component will build from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderImage {
    /// Pre-existing stream in the shared namespace; never owned by a component.
    Shared(ImageStream),
    /// Stream to create in the component's namespace from an external image.
    Synthesized(ImageStream),
}

impl BuilderImage {
    /// The planned stream, as found or as it will be created.
    pub const fn stream(&self) -> &ImageStream {
        match self {
            Self::Shared(stream) | Self::Synthesized(stream) => stream,
        }
    }

    /// Whether the stream comes from the shared namespace.
    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/// Reference to the tag of `stream` a build pulls its builder from.
pub fn builder_reference(stream: &ImageStream) -> ObjectReference {
    ObjectReference::image_stream_tag(
        stream.metadata.namespace.clone(),
        &stream.metadata.name,
        stream.preferred_tag(),
    )
}

/// Resolves the builder image for components.
pub struct BuilderImageResolver<'a> {
    store: &'a dyn ClusterStore,
    config: &'a ReconcilerConfig,
}

impl<'a> BuilderImageResolver<'a> {
    /// Resolver reading from `store` with the mapping in `config`.
    pub const fn new(store: &'a dyn ClusterStore, config: &'a ReconcilerConfig) -> Self {
        Self { store, config }
    }

    /// Decide which builder image `component` uses, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BuilderImageNotFound`] when there is neither a shared
    /// stream nor a configured external image, and passes through any store
    /// error other than not-found.
    pub async fn plan(&self, component: &Component) -> Result<BuilderImage> {
        let build_type = component.spec.build_type.as_str();
        let namespace = self.config.system_namespace.as_str();

        match self.store.get_as::<ImageStream>(namespace, build_type).await {
            Ok(shared) => {
                debug!(namespace, build_type, "Using shared builder image stream");
                return Ok(BuilderImage::Shared(shared));
            }
            Err(e) if e.is_not_found() => {
                debug!(namespace, build_type, "No shared builder image stream");
            }
            Err(e) => {
                warn!(namespace, build_type, error = %e, "Looking up shared builder image failed");
                return Err(e.into());
            }
        }

        let Some(external_image) = self.config.builder_image(build_type) else {
            warn!(build_type, "No builder image configured for build type");
            return Err(Error::builder_image_not_found(build_type));
        };

        Ok(BuilderImage::Synthesized(
            ResourceSynthesizer::builder_image_stream(component, external_image),
        ))
    }

    /// Make a planned builder image exist. Shared streams are returned untouched.
    ///
    /// # Errors
    ///
    /// Returns any error from ensuring the synthesized stream.
    pub async fn realize(
        &self,
        builder: BuilderImage,
        materializer: &Materializer<'_>,
    ) -> Result<(ImageStream, EnsureRecord)> {
        match builder {
            BuilderImage::Shared(stream) => {
                let record = EnsureRecord::new(stream.key(), EnsureAction::Shared);
                Ok((stream, record))
            }
            BuilderImage::Synthesized(desired) => {
                let ensured: Ensured<ImageStream> = materializer.ensure_exists(desired).await?;
                if ensured.was_created() {
                    info!(
                        name = %ensured.get().metadata.name,
                        namespace = %ensured.get().metadata.namespace,
                        "Created builder image stream from external image"
                    );
                }
                let record = ensured.record();
                Ok((ensured.into_inner(), record))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use kiln_store::{ComponentSpec, InMemoryClusterStore, ObjectMeta, is_controlled_by};

    use super::*;

    async fn setup(build_type: &str) -> (InMemoryClusterStore, Component) {
        let store = InMemoryClusterStore::new();
        let component = store
            .create_as(Component::new("dev", "web", ComponentSpec::new("src", build_type)))
            .await
            .unwrap();
        (store, component)
    }

    #[tokio::test]
    async fn test_shared_stream_is_preferred() {
        let (store, component) = setup("nodejs").await;
        store
            .create_as(ImageStream::empty(ObjectMeta::named("openshift", "nodejs")))
            .await
            .unwrap();
        let config = ReconcilerConfig::default();
        let resolver = BuilderImageResolver::new(&store, &config);
        let materializer = Materializer::new(&store, &component);

        let builder = resolver.plan(&component).await.unwrap();
        let (stream, _) = resolver.realize(builder, &materializer).await.unwrap();

        assert_eq!(stream.metadata.namespace, "openshift");
        assert!(stream.metadata.owner_references.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_mapped_build_type_synthesizes_owned_stream() {
        let (store, component) = setup("nodejs").await;
        let config = ReconcilerConfig::default();
        let resolver = BuilderImageResolver::new(&store, &config);
        let materializer = Materializer::new(&store, &component);

        let builder = resolver.plan(&component).await.unwrap();
        let (stream, _) = resolver.realize(builder, &materializer).await.unwrap();

        assert_eq!(stream.metadata.namespace, "dev");
        assert_eq!(stream.metadata.name, "web-builder");
        assert!(is_controlled_by(&stream.metadata, &component));
        let from = stream.spec.tags.first().and_then(|t| t.from.as_ref()).unwrap();
        assert_eq!(from.name, "nodeshift/centos7-s2i-nodejs:10.x");
    }

    #[tokio::test]
    async fn test_unmapped_build_type_fails_without_writes() {
        let (store, component) = setup("cobol").await;
        store.reset_operations();
        let config = ReconcilerConfig::default();
        let resolver = BuilderImageResolver::new(&store, &config);

        let result = resolver.plan(&component).await;

        assert!(matches!(result, Err(Error::BuilderImageNotFound { .. })));
        assert_eq!(store.operations().creates, 0);
    }

    #[tokio::test]
    async fn test_builder_reference_uses_preferred_tag() {
        let (store, component) = setup("nodejs").await;
        let config = ReconcilerConfig::default();
        let resolver = BuilderImageResolver::new(&store, &config);

        let builder = resolver.plan(&component).await.unwrap();

        assert!(!builder.is_shared());
        assert_eq!(
            builder_reference(builder.stream()),
            ObjectReference::image_stream_tag("dev", "web-builder", "latest")
        );
    }
}
