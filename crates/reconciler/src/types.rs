//! Core types for the reconciler.

use std::fmt;

use itertools::Itertools;
use kiln_store::{Component, ObjectKey, ResourceKind};
use serde::{Deserialize, Serialize};

/// Identity of a component to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    pub namespace: String,
    pub name: String,
}

impl ComponentKey {
    /// Key for the component `name` in `namespace`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Store key of the component object.
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(ResourceKind::Component, self.namespace.clone(), self.name.clone())
    }

    /// Component key for a store key, if it names a component.
    pub fn from_object_key(key: &ObjectKey) -> Option<Self> {
        (key.kind == ResourceKind::Component).then(|| Self::new(key.namespace.clone(), key.name.clone()))
    }
}

impl From<&Component> for ComponentKey {
    fn from(component: &Component) -> Self {
        Self::new(component.namespace(), component.name())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What happened to one derived object during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnsureAction {
    /// Created by this run.
    Created,
    /// Already present; left untouched.
    Existing,
    /// Taken from the shared builder pool; not owned by the component.
    Shared,
}

impl fmt::Display for EnsureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Existing => "existing",
            Self::Shared => "shared",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureRecord {
    pub key: ObjectKey,
    pub action: EnsureAction,
}

impl EnsureRecord {
    /// Record `action` for the object at `key`.
    pub const fn new(key: ObjectKey, action: EnsureAction) -> Self {
        Self { key, action }
    }
}

/// Objects touched by one successful convergence run, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Generation recorded as converged.
    pub generation: String,
    pub resources: Vec<EnsureRecord>,
}

impl ConvergenceReport {
    /// Empty report for `generation`.
    pub fn new(generation: impl Into<String>) -> Self {
        Self {
            generation: generation.into(),
            resources: Vec::new(),
        }
    }

    /// Append the next touched object.
    pub fn push(&mut self, record: EnsureRecord) {
        self.resources.push(record);
    }

    /// Objects created by this run.
    pub fn created(&self) -> Vec<&ObjectKey> {
        self.with_action(EnsureAction::Created)
    }

    /// Objects that were already present.
    pub fn existing(&self) -> Vec<&ObjectKey> {
        self.with_action(EnsureAction::Existing)
    }

    /// Kinds created by this run, in creation order.
    pub fn created_kinds(&self) -> Vec<ResourceKind> {
        self.created().into_iter().map(|k| k.kind).collect_vec()
    }

    fn with_action(&self, action: EnsureAction) -> Vec<&ObjectKey> {
        self.resources
            .iter()
            .filter(|r| r.action == action)
            .map(|r| &r.key)
            .collect_vec()
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The component no longer exists.
    Gone,
    /// The component is being deleted; owned objects go with it.
    Deleting,
    /// The current generation was already converged.
    UpToDate,
    /// The convergence sequence ran to completion.
    Converged(ConvergenceReport),
}

impl ReconcileOutcome {
    /// The report of a converged run.
    pub const fn report(&self) -> Option<&ConvergenceReport> {
        match self {
            Self::Converged(report) => Some(report),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gone => write!(f, "gone"),
            Self::Deleting => write!(f, "deleting"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Converged(report) => write!(
                f,
                "converged generation {} ({} created, {} existing)",
                report.generation,
                report.created().len(),
                report.existing().len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_key_round_trip() {
        let key = ComponentKey::new("dev", "web");
        assert_eq!(key.to_string(), "dev/web");
        assert_eq!(ComponentKey::from_object_key(&key.object_key()), Some(key));
    }

    #[test]
    fn test_component_key_ignores_other_kinds() {
        let key = ObjectKey::new(ResourceKind::Service, "dev", "web");
        assert!(ComponentKey::from_object_key(&key).is_none());
    }

    #[test]
    fn test_report_partitions_actions() {
        let mut report = ConvergenceReport::new("2");
        report.push(EnsureRecord::new(
            ObjectKey::new(ResourceKind::ImageStream, "dev", "web"),
            EnsureAction::Existing,
        ));
        report.push(EnsureRecord::new(
            ObjectKey::new(ResourceKind::Service, "dev", "web"),
            EnsureAction::Created,
        ));
        report.push(EnsureRecord::new(
            ObjectKey::new(ResourceKind::ImageStream, "openshift", "nodejs"),
            EnsureAction::Shared,
        ));

        assert_eq!(report.created_kinds(), vec![ResourceKind::Service]);
        assert_eq!(report.existing().len(), 1);

        let outcome = ReconcileOutcome::Converged(report);
        assert_eq!(outcome.to_string(), "converged generation 2 (1 created, 1 existing)");
        assert!(outcome.report().is_some());
        assert!(ReconcileOutcome::UpToDate.report().is_none());
    }
}
