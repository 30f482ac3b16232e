//! The type-erased [`Object`] the store holds, and the [`Resource`] trait
//! connecting it to the typed resource structs.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::meta::{ObjectKey, ObjectMeta, ResourceKind};
use crate::resources::{
    BuildConfig, Component, DeploymentConfig, GitSource, ImageStream, Route, Service,
};

/// A typed resource that can be stored as an [`Object`].
pub trait Resource:
    Clone + Send + Sync + 'static + Into<Object> + TryFrom<Object, Error = StoreError>
{
    const KIND: ResourceKind;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Store key of this resource.
    fn key(&self) -> ObjectKey {
        let meta = self.meta();
        ObjectKey::new(Self::KIND, meta.namespace.clone(), meta.name.clone())
    }
}

/// Any object the store can hold, tagged by `kind` in manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Object {
    Component(Component),
    GitSource(GitSource),
    ImageStream(ImageStream),
    BuildConfig(BuildConfig),
    DeploymentConfig(DeploymentConfig),
    Service(Service),
    Route(Route),
}

impl Object {
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Component(_) => ResourceKind::Component,
            Self::GitSource(_) => ResourceKind::GitSource,
            Self::ImageStream(_) => ResourceKind::ImageStream,
            Self::BuildConfig(_) => ResourceKind::BuildConfig,
            Self::DeploymentConfig(_) => ResourceKind::DeploymentConfig,
            Self::Service(_) => ResourceKind::Service,
            Self::Route(_) => ResourceKind::Route,
        }
    }

    pub const fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Component(o) => &o.metadata,
            Self::GitSource(o) => &o.metadata,
            Self::ImageStream(o) => &o.metadata,
            Self::BuildConfig(o) => &o.metadata,
            Self::DeploymentConfig(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::Route(o) => &o.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Component(o) => &mut o.metadata,
            Self::GitSource(o) => &mut o.metadata,
            Self::ImageStream(o) => &mut o.metadata,
            Self::BuildConfig(o) => &mut o.metadata,
            Self::DeploymentConfig(o) => &mut o.metadata,
            Self::Service(o) => &mut o.metadata,
            Self::Route(o) => &mut o.metadata,
        }
    }

    pub fn key(&self) -> ObjectKey {
        let meta = self.meta();
        ObjectKey::new(self.kind(), meta.namespace.clone(), meta.name.clone())
    }

    /// Convert into a typed resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KindMismatch`] if the object is of another kind.
    pub fn into_resource<R: Resource>(self) -> Result<R, StoreError> {
        R::try_from(self)
    }
}

macro_rules! impl_resource {
    ($ty:ident) => {
        impl Resource for $ty {
            const KIND: ResourceKind = ResourceKind::$ty;

            fn meta(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }
        }

        impl From<$ty> for Object {
            fn from(value: $ty) -> Self {
                Self::$ty(value)
            }
        }

        impl TryFrom<Object> for $ty {
            type Error = StoreError;

            fn try_from(object: Object) -> Result<Self, Self::Error> {
                match object {
                    Object::$ty(value) => Ok(value),
                    other => Err(StoreError::KindMismatch {
                        expected: ResourceKind::$ty,
                        actual: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_resource!(Component);
impl_resource!(GitSource);
impl_resource!(ImageStream);
impl_resource!(BuildConfig);
impl_resource!(DeploymentConfig);
impl_resource!(Service);
impl_resource!(Route);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::ComponentSpec;

    #[test]
    fn test_object_round_trips_through_kind_tag() {
        let yaml = r"
kind: Component
apiVersion: devconsole.openshift.io/v1alpha1
metadata:
  name: web
  namespace: dev
spec:
  gitSourceRef: web-src
  buildType: nodejs
  port: 9000
  exposed: true
";
        let object: Object = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(object.kind(), ResourceKind::Component);

        let component: Component = object.into_resource().unwrap();
        assert_eq!(component.spec.port, 9000);
        assert!(component.spec.exposed);
        assert!(component.status.rev_number.is_empty());
    }

    #[test]
    fn test_kind_mismatch() {
        let object = Object::from(GitSource::new("dev", "web-src", "https://example.com/web.git"));
        let result: Result<Component, _> = object.into_resource();
        assert!(matches!(
            result,
            Err(StoreError::KindMismatch {
                expected: ResourceKind::Component,
                actual: ResourceKind::GitSource
            })
        ));
    }

    #[test]
    fn test_key_from_resource() {
        let component = Component::new("dev", "web", ComponentSpec::new("src", "nodejs"));
        assert_eq!(
            component.key(),
            ObjectKey::new(ResourceKind::Component, "dev", "web")
        );
        assert_eq!(Object::from(component).key().name, "web");
    }
}
