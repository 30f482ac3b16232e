//! Shared fixtures for reconciler behavior tests.

#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use kiln_reconciler::{ComponentKey, ComponentReconciler, ReconcilerConfig};
use kiln_store::{
    ClusterStore, Component, ComponentSpec, ComponentStatus, GitSource, InMemoryClusterStore,
    Object, ObjectKey, ResourceKind, Result, StoreError, StoreEvent, StoreExt,
};
use tokio::sync::broadcast;

pub const NAMESPACE: &str = "dev";
pub const SOURCE: &str = "web-src";

/// Failure injected into a [`FaultyStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Get(ResourceKind),
    Create(ResourceKind),
    StatusUpdate,
}

/// Store wrapper failing selected operations as unavailable.
pub struct FaultyStore {
    inner: Arc<InMemoryClusterStore>,
    fault: RwLock<Option<Fault>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryClusterStore>) -> Self {
        Self {
            inner,
            fault: RwLock::new(None),
        }
    }

    pub fn inject(&self, fault: Fault) {
        if let Ok(mut current) = self.fault.write() {
            *current = Some(fault);
        }
    }

    pub fn heal(&self) {
        if let Ok(mut current) = self.fault.write() {
            *current = None;
        }
    }

    fn check(&self, operation: Fault) -> Result<()> {
        let active = self.fault.read().ok().and_then(|fault| *fault);
        if active == Some(operation) {
            return Err(StoreError::unavailable(
                format!("{operation:?}"),
                "injected fault",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for FaultyStore {
    async fn get(&self, key: &ObjectKey) -> Result<Object> {
        self.check(Fault::Get(key.kind))?;
        self.inner.get(key).await
    }

    async fn create(&self, object: Object) -> Result<Object> {
        self.check(Fault::Create(object.kind()))?;
        self.inner.create(object).await
    }

    async fn update_component_status(
        &self,
        key: &ObjectKey,
        status: ComponentStatus,
    ) -> Result<Component> {
        self.check(Fault::StatusUpdate)?;
        self.inner.update_component_status(key, status).await
    }

    async fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Object>> {
        self.inner.list(kind, namespace).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.subscribe()
    }
}

/// Store holding the git source every component in these tests points at.
pub async fn store_with_source() -> Result<Arc<InMemoryClusterStore>> {
    let store = InMemoryClusterStore::new_arc();
    store
        .create_as(
            GitSource::new(NAMESPACE, SOURCE, "https://github.com/example/web.git")
                .with_reference("main"),
        )
        .await?;
    Ok(store)
}

/// Create a component and return its key.
pub async fn seed_component(
    store: &dyn ClusterStore,
    name: &str,
    spec: ComponentSpec,
) -> Result<ComponentKey> {
    let component = store.create_as(Component::new(NAMESPACE, name, spec)).await?;
    Ok(ComponentKey::from(&component))
}

pub fn reconciler(
    store: Arc<dyn ClusterStore>,
    config: ReconcilerConfig,
) -> kiln_reconciler::Result<ComponentReconciler> {
    ComponentReconciler::new(store, config)
}

pub fn key(kind: ResourceKind, name: &str) -> ObjectKey {
    ObjectKey::new(kind, NAMESPACE, name)
}

pub async fn component(store: &dyn ClusterStore, name: &str) -> Result<Component> {
    store.get_as::<Component>(NAMESPACE, name).await
}
