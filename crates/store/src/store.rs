//! Cluster store trait and implementations.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use ulid::Ulid;

use crate::error::{Result, StoreError};
use crate::meta::{ObjectKey, ResourceKind};
use crate::object::{Object, Resource};
use crate::resources::{Component, ComponentSpec, ComponentStatus};

/// Capacity of the change notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Change notification emitted by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(ObjectKey),
    Modified(ObjectKey),
}

impl StoreEvent {
    pub const fn key(&self) -> &ObjectKey {
        match self {
            Self::Added(key) | Self::Modified(key) => key,
        }
    }
}

/// Trait for cluster storage backends.
///
/// Implementations must report a missing object as [`StoreError::NotFound`] and
/// a create of an existing key as [`StoreError::AlreadyExists`]; callers rely
/// on both to stay idempotent.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Read an object by key.
    async fn get(&self, key: &ObjectKey) -> Result<Object>;

    /// Create an object; fails if the key is taken.
    async fn create(&self, object: Object) -> Result<Object>;

    /// Replace the status sub-structure of a component.
    async fn update_component_status(
        &self,
        key: &ObjectKey,
        status: ComponentStatus,
    ) -> Result<Component>;

    /// List objects of a kind, optionally restricted to a namespace.
    async fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Object>>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Typed helpers over [`ClusterStore`].
#[async_trait]
pub trait StoreExt: ClusterStore {
    /// Read a typed resource.
    async fn get_as<R: Resource>(&self, namespace: &str, name: &str) -> Result<R> {
        self.get(&ObjectKey::new(R::KIND, namespace, name))
            .await?
            .into_resource()
    }

    /// Create a typed resource and return the stored copy.
    async fn create_as<R: Resource>(&self, resource: R) -> Result<R> {
        self.create(resource.into()).await?.into_resource()
    }

    /// List typed resources.
    async fn list_as<R: Resource>(&self, namespace: Option<&str>) -> Result<Vec<R>> {
        self.list(R::KIND, namespace)
            .await?
            .into_iter()
            .map(Object::into_resource)
            .collect()
    }
}

impl<S: ClusterStore + ?Sized> StoreExt for S {}

/// Number of calls made against an [`InMemoryClusterStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub creates: usize,
    pub status_updates: usize,
    pub lists: usize,
}

impl OperationCounts {
    /// Reads plus writes, excluding lists.
    pub const fn total(&self) -> usize {
        self.gets
            .saturating_add(self.creates)
            .saturating_add(self.status_updates)
    }
}

#[derive(Default)]
struct Counters {
    gets: AtomicUsize,
    creates: AtomicUsize,
    status_updates: AtomicUsize,
    lists: AtomicUsize,
}

/// In-memory cluster store.
///
/// Assigns uids and resource versions on create, starts every object at
/// generation 1, and bumps the generation only on spec changes.
pub struct InMemoryClusterStore {
    objects: RwLock<BTreeMap<ObjectKey, Object>>,
    next_version: AtomicU64,
    counters: Counters,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for InMemoryClusterStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            objects: RwLock::new(BTreeMap::new()),
            next_version: AtomicU64::new(1),
            counters: Counters::default(),
            events,
        }
    }
}

impl InMemoryClusterStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory store wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of the operation counters.
    pub fn operations(&self) -> OperationCounts {
        OperationCounts {
            gets: self.counters.gets.load(Ordering::Relaxed),
            creates: self.counters.creates.load(Ordering::Relaxed),
            status_updates: self.counters.status_updates.load(Ordering::Relaxed),
            lists: self.counters.lists.load(Ordering::Relaxed),
        }
    }

    /// Zero the operation counters.
    pub fn reset_operations(&self) {
        self.counters.gets.store(0, Ordering::Relaxed);
        self.counters.creates.store(0, Ordering::Relaxed);
        self.counters.status_updates.store(0, Ordering::Relaxed);
        self.counters.lists.store(0, Ordering::Relaxed);
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Whether an object with this key exists. Not counted as a read.
    pub async fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Replace a component's spec the way a user edit would, bumping its generation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the component does not exist.
    pub async fn replace_component_spec(
        &self,
        key: &ObjectKey,
        spec: ComponentSpec,
    ) -> Result<Component> {
        let version = self.next_resource_version();
        let updated = {
            let mut objects = self.objects.write().await;
            let Some(Object::Component(component)) = objects.get_mut(key) else {
                return Err(StoreError::not_found(key.clone()));
            };
            component.spec = spec;
            component.metadata.generation = component.metadata.generation.saturating_add(1);
            component.metadata.resource_version = Some(version);
            component.clone()
        };
        self.notify(StoreEvent::Modified(key.clone()));
        Ok(updated)
    }

    /// Set the deletion marker on an object, as a delete with pending garbage collection would.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist.
    pub async fn mark_deleting(&self, key: &ObjectKey) -> Result<()> {
        let version = self.next_resource_version();
        {
            let mut objects = self.objects.write().await;
            let object = objects
                .get_mut(key)
                .ok_or_else(|| StoreError::not_found(key.clone()))?;
            let meta = object.meta_mut();
            meta.deletion_timestamp = Some(Utc::now());
            meta.resource_version = Some(version);
        }
        self.notify(StoreEvent::Modified(key.clone()));
        Ok(())
    }

    fn next_resource_version(&self) -> String {
        self.next_version.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn notify(&self, event: StoreEvent) {
        // No receivers is not an error.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl ClusterStore for InMemoryClusterStore {
    async fn get(&self, key: &ObjectKey) -> Result<Object> {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().await;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))
    }

    async fn create(&self, mut object: Object) -> Result<Object> {
        self.counters.creates.fetch_add(1, Ordering::Relaxed);

        let key = object.key();
        if key.name.is_empty() {
            return Err(StoreError::invalid(format!("{} has no name", key.kind)));
        }
        if key.namespace.is_empty() {
            return Err(StoreError::invalid(format!(
                "{} '{}' has no namespace",
                key.kind, key.name
            )));
        }

        let version = self.next_resource_version();
        {
            let mut objects = self.objects.write().await;
            if objects.contains_key(&key) {
                return Err(StoreError::already_exists(key));
            }

            let meta = object.meta_mut();
            meta.uid = Some(Ulid::new().to_string());
            meta.resource_version = Some(version);
            meta.generation = 1;
            meta.creation_timestamp = Some(Utc::now());

            objects.insert(key.clone(), object.clone());
        }

        self.notify(StoreEvent::Added(key));
        Ok(object)
    }

    async fn update_component_status(
        &self,
        key: &ObjectKey,
        status: ComponentStatus,
    ) -> Result<Component> {
        self.counters.status_updates.fetch_add(1, Ordering::Relaxed);

        let version = self.next_resource_version();
        let updated = {
            let mut objects = self.objects.write().await;
            let Some(Object::Component(component)) = objects.get_mut(key) else {
                return Err(StoreError::not_found(key.clone()));
            };
            component.status = status;
            component.metadata.resource_version = Some(version);
            component.clone()
        };

        self.notify(StoreEvent::Modified(key.clone()));
        Ok(updated)
    }

    async fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Object>> {
        self.counters.lists.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .filter(|(key, _)| namespace.is_none_or(|ns| key.namespace == ns))
            .map(|(_, object)| object.clone())
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// A wrapper that adds tracing to a cluster store.
pub struct TracingClusterStore<S: ClusterStore> {
    inner: S,
}

impl<S: ClusterStore> TracingClusterStore<S> {
    /// Create a new tracing store.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Access the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ClusterStore> ClusterStore for TracingClusterStore<S> {
    async fn get(&self, key: &ObjectKey) -> Result<Object> {
        tracing::debug!(key = %key, "Reading object");
        let result = self.inner.get(key).await;
        if let Err(ref e) = result {
            tracing::trace!(key = %key, error = %e, "Read failed");
        }
        result
    }

    async fn create(&self, object: Object) -> Result<Object> {
        let key = object.key();
        tracing::debug!(key = %key, "Creating object");
        let result = self.inner.create(object).await;
        if let Ok(ref created) = result {
            tracing::trace!(
                key = %key,
                uid = created.meta().uid.as_deref().unwrap_or_default(),
                "Object created"
            );
        }
        result
    }

    async fn update_component_status(
        &self,
        key: &ObjectKey,
        status: ComponentStatus,
    ) -> Result<Component> {
        tracing::debug!(key = %key, rev_number = %status.rev_number, "Updating component status");
        self.inner.update_component_status(key, status).await
    }

    async fn list(&self, kind: ResourceKind, namespace: Option<&str>) -> Result<Vec<Object>> {
        tracing::debug!(kind = %kind, namespace = ?namespace, "Listing objects");
        self.inner.list(kind, namespace).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resources::{GitSource, Service};

    fn component(name: &str) -> Component {
        Component::new("dev", name, ComponentSpec::new("src", "nodejs"))
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let store = InMemoryClusterStore::new();

        let created = store.create_as(component("web")).await.unwrap();

        assert!(created.metadata.uid.is_some());
        assert!(created.metadata.resource_version.is_some());
        assert!(created.metadata.creation_timestamp.is_some());
        assert_eq!(created.metadata.generation, 1);
    }

    #[tokio::test]
    async fn test_create_conflict_is_distinct() {
        let store = InMemoryClusterStore::new();
        store.create_as(component("web")).await.unwrap();

        let result = store.create_as(component("web")).await;

        assert!(result.as_ref().is_err_and(StoreError::is_already_exists));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryClusterStore::new();

        let result = store.get_as::<Service>("dev", "web").await;

        assert!(result.as_ref().is_err_and(StoreError::is_not_found));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_namespace() {
        let store = InMemoryClusterStore::new();

        let result = store
            .create_as(Component::new("", "web", ComponentSpec::default()))
            .await;

        assert!(matches!(result, Err(StoreError::Invalid { .. })));
    }

    #[tokio::test]
    async fn test_status_update_keeps_generation() {
        let store = InMemoryClusterStore::new();
        let created = store.create_as(component("web")).await.unwrap();

        let updated = store
            .update_component_status(
                &created.key(),
                ComponentStatus {
                    rev_number: "1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.metadata.generation, 1);
        assert_eq!(updated.status.rev_number, "1");
        assert_ne!(
            updated.metadata.resource_version,
            created.metadata.resource_version
        );
    }

    #[tokio::test]
    async fn test_spec_replace_bumps_generation() {
        let store = InMemoryClusterStore::new();
        let created = store.create_as(component("web")).await.unwrap();

        let updated = store
            .replace_component_spec(&created.key(), ComponentSpec::new("src", "nodejs").with_port(9000))
            .await
            .unwrap();

        assert_eq!(updated.metadata.generation, 2);
        assert_eq!(updated.spec.port, 9000);
    }

    #[tokio::test]
    async fn test_list_filters_kind_and_namespace() {
        let store = InMemoryClusterStore::new();
        store.create_as(component("a")).await.unwrap();
        store
            .create_as(Component::new("prod", "b", ComponentSpec::default()))
            .await
            .unwrap();
        store
            .create_as(GitSource::new("dev", "src", "https://example.com/a.git"))
            .await
            .unwrap();

        let all: Vec<Component> = store.list_as(None).await.unwrap();
        let dev: Vec<Component> = store.list_as(Some("dev")).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(dev.len(), 1);
        assert_eq!(dev.first().map(Component::name), Some("a"));
    }

    #[tokio::test]
    async fn test_operation_counts() {
        let store = InMemoryClusterStore::new();
        store.create_as(component("web")).await.unwrap();
        let _ = store.get_as::<Component>("dev", "web").await;
        let _ = store.get_as::<Component>("dev", "missing").await;

        let counts = store.operations();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.gets, 2);
        assert_eq!(counts.total(), 3);

        store.reset_operations();
        assert_eq!(store.operations(), OperationCounts::default());
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let store = InMemoryClusterStore::new();
        let mut events = store.subscribe();

        let created = store.create_as(component("web")).await.unwrap();
        store.mark_deleting(&created.key()).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Added(created.key()));
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Modified(created.key())
        );
    }

    #[tokio::test]
    async fn test_tracing_store_delegates() {
        let store = TracingClusterStore::new(InMemoryClusterStore::new());
        store.create_as(component("web")).await.unwrap();

        let fetched = store.get_as::<Component>("dev", "web").await.unwrap();

        assert_eq!(fetched.name(), "web");
        assert_eq!(store.inner().operations().gets, 1);
    }
}
