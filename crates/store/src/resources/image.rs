use serde::{Deserialize, Serialize};

use super::ObjectReference;
use crate::meta::ObjectMeta;

/// Tag used when a stream does not name a better one.
pub const DEFAULT_TAG: &str = "latest";

/// A named set of image tags; builder input or build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStream {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ImageStreamSpec,
    #[serde(default)]
    pub status: ImageStreamStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    #[serde(default)]
    pub lookup_policy: LookupPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupPolicy {
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamStatus {
    /// Registry location images are pushed to, filled in by the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image_repository: Option<String>,
}

impl ImageStream {
    /// An empty stream with no tags.
    pub fn empty(metadata: ObjectMeta) -> Self {
        Self {
            metadata,
            spec: ImageStreamSpec::default(),
            status: ImageStreamStatus::default(),
        }
    }

    /// Tag to build from: `latest` when present, otherwise the first declared tag.
    pub fn preferred_tag(&self) -> &str {
        self.spec
            .tags
            .iter()
            .find(|t| t.name == DEFAULT_TAG)
            .or_else(|| self.spec.tags.first())
            .map_or(DEFAULT_TAG, |t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> TagReference {
        TagReference {
            name: name.to_string(),
            from: None,
        }
    }

    #[test]
    fn test_preferred_tag_defaults_to_latest() {
        let stream = ImageStream::empty(ObjectMeta::named("dev", "web"));
        assert_eq!(stream.preferred_tag(), "latest");
    }

    #[test]
    fn test_preferred_tag_prefers_latest_over_order() {
        let mut stream = ImageStream::empty(ObjectMeta::named("openshift", "nodejs"));
        stream.spec.tags = vec![tag("10"), tag("latest")];
        assert_eq!(stream.preferred_tag(), "latest");
    }

    #[test]
    fn test_preferred_tag_falls_back_to_first() {
        let mut stream = ImageStream::empty(ObjectMeta::named("openshift", "nodejs"));
        stream.spec.tags = vec![tag("12"), tag("10")];
        assert_eq!(stream.preferred_tag(), "12");
    }
}
