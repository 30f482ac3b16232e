//! Component reconciler implementation.

use std::sync::Arc;

use kiln_core::GenericResultExt;
use kiln_store::{ClusterStore, Component, GitSource, Resource, StoreError, StoreExt};
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::gate::{self, GateDecision};
use crate::materialize::Materializer;
use crate::resolve::{BuilderImageResolver, builder_reference};
use crate::synthesize::ResourceSynthesizer;
use crate::types::{ComponentKey, ConvergenceReport, ReconcileOutcome};

/// K8s-style reconciler turning a Component into its derived objects.
///
/// One call to [`reconcile`](Self::reconcile) is a single synchronous pass of
/// reads and creates. An error asks the caller to redeliver; the next pass
/// picks up whatever the failed one left behind.
pub struct ComponentReconciler {
    /// Cluster store.
    store: Arc<dyn ClusterStore>,
    /// Configuration.
    config: ReconcilerConfig,
}

impl ComponentReconciler {
    /// Create a new reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(store: Arc<dyn ClusterStore>, config: ReconcilerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Reconcile the component identified by `key`.
    ///
    /// The component is re-read rather than taken from the triggering event.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the run; see [`Error`] for the taxonomy.
    pub async fn reconcile(&self, key: &ComponentKey) -> Result<ReconcileOutcome> {
        info!(namespace = %key.namespace, name = %key.name, "Reconciling Component");

        let component = match self
            .store
            .get_as::<Component>(&key.namespace, &key.name)
            .await
        {
            Ok(component) => component,
            Err(e) if e.is_not_found() => {
                // Deleted after the request was queued; owned objects are garbage collected.
                debug!(component = %key, "Component not found, nothing to do");
                return Ok(ReconcileOutcome::Gone);
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            component = %key,
            generation = component.metadata.generation,
            resource_version = component.metadata.resource_version.as_deref().unwrap_or_default(),
            rev_number = %component.status.rev_number,
            deleting = component.metadata.is_deleting(),
            "Observed component"
        );

        match gate::evaluate(&component) {
            GateDecision::Deleting => {
                info!(component = %key, "Component is being deleted");
                return Ok(ReconcileOutcome::Deleting);
            }
            GateDecision::UpToDate => {
                debug!(component = %key, "Generation already converged");
                return Ok(ReconcileOutcome::UpToDate);
            }
            GateDecision::Admit => {}
        }

        let report = self.converge(&component).await.tap_err(|e| {
            warn!(component = %key, class = %e.class(), error = %e, "Convergence failed");
        })?;

        self.store
            .update_component_status(&component.key(), gate::converged_status(&component))
            .await?;

        info!(
            component = %key,
            generation = %report.generation,
            created = report.created().len(),
            "All resources have been successfully created"
        );
        Ok(ReconcileOutcome::Converged(report))
    }

    /// Ensure every derived object exists, stopping at the first failure.
    async fn converge(&self, component: &Component) -> Result<ConvergenceReport> {
        let source_ref = component.spec.git_source_ref.trim();
        if source_ref.is_empty() {
            return Err(Error::validation("git source reference is not provided"));
        }
        if component.spec.build_type.trim().is_empty() {
            return Err(Error::validation("build type is not provided"));
        }

        let synthesizer = ResourceSynthesizer::new(&self.config);
        let port = synthesizer.service_port(component)?;

        let git_source = self
            .store
            .get_as::<GitSource>(component.namespace(), source_ref)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } | StoreError::KindMismatch { .. } => {
                    Error::source_resolution(source_ref, e)
                }
                other => Error::Store(other),
            })?;

        let resolver = BuilderImageResolver::new(self.store.as_ref(), &self.config);
        let builder = resolver.plan(component).await?;
        debug!(
            component = component.name(),
            builder = %builder.stream().metadata.name,
            shared = builder.is_shared(),
            "Planned builder image"
        );

        let materializer = Materializer::new(self.store.as_ref(), component);
        let mut report = ConvergenceReport::new(component.generation_token());

        let output = materializer
            .ensure_exists(ResourceSynthesizer::output_image_stream(component))
            .await?;
        report.push(output.record());
        let output = output.into_inner();

        let (builder, record) = resolver.realize(builder, &materializer).await?;
        report.push(record);

        let build = materializer
            .ensure_exists(ResourceSynthesizer::build_config(
                component,
                &git_source,
                builder_reference(&builder),
            ))
            .await?;
        report.push(build.record());

        let deployment = materializer
            .ensure_exists(ResourceSynthesizer::deployment_config(component, &output, port))
            .await?;
        report.push(deployment.record());

        let service = materializer
            .ensure_exists(ResourceSynthesizer::service(component, port))
            .await?;
        report.push(service.record());
        let service = service.into_inner();

        if let Some(route) = ResourceSynthesizer::route(component, &service) {
            let route = materializer.ensure_exists(route).await?;
            report.push(route.record());
        }

        Ok(report)
    }

    /// Get the store.
    pub fn store(&self) -> &Arc<dyn ClusterStore> {
        &self.store
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

/// Builder for [`ComponentReconciler`].
pub struct ReconcilerBuilder {
    store: Option<Arc<dyn ClusterStore>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            store: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the cluster store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ClusterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Map a build type to an external builder image.
    #[must_use]
    pub fn builder_image(mut self, build_type: impl Into<String>, image: impl Into<String>) -> Self {
        self.config = self.config.with_builder_image(build_type, image);
        self
    }

    /// Set the default service port.
    #[must_use]
    pub fn default_port(mut self, port: i32) -> Self {
        self.config = self.config.default_port(port);
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] without a store or with an invalid configuration.
    pub fn build(self) -> Result<ComponentReconciler> {
        let store = self
            .store
            .ok_or_else(|| Error::invalid_config("cluster store is required"))?;

        ComponentReconciler::new(store, self.config)
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
