//! Configuration for the component reconciler.

use std::collections::BTreeMap;
use std::path::Path;

use kiln_core::OptionExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Highest legal TCP/UDP port.
pub const MAX_PORT: i32 = 65_535;

/// Reconciler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Namespace searched for shared builder image streams.
    #[serde(default = "default_system_namespace")]
    pub system_namespace: String,

    /// Service port used when a component does not set one.
    #[serde(default = "default_port")]
    pub default_port: i32,

    /// Build type -> external builder image.
    #[serde(default = "default_builder_images")]
    pub builder_images: BTreeMap<String, String>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            system_namespace: default_system_namespace(),
            default_port: default_port(),
            builder_images: default_builder_images(),
        }
    }
}

impl ReconcilerConfig {
    /// Configuration without any builder image mapping.
    pub fn without_builder_images() -> Self {
        Self {
            builder_images: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Set the shared builder namespace.
    #[must_use]
    pub fn system_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.system_namespace = namespace.into();
        self
    }

    /// Set the default service port.
    #[must_use]
    pub const fn default_port(mut self, port: i32) -> Self {
        self.default_port = port;
        self
    }

    /// Map a build type to an external image.
    #[must_use]
    pub fn with_builder_image(
        mut self,
        build_type: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        self.builder_images.insert(build_type.into(), image.into());
        self
    }

    /// External image configured for `build_type`.
    pub fn builder_image(&self, build_type: &str) -> Option<&str> {
        self.builder_images.get(build_type).map(String::as_str)
    }

    /// Check the configuration for values the reconciler cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.system_namespace.trim().is_empty() {
            return Err(Error::invalid_config("system namespace must not be empty"));
        }
        if !(1..=MAX_PORT).contains(&self.default_port) {
            return Err(Error::invalid_config(format!(
                "default port {} is outside 1..={MAX_PORT}",
                self.default_port
            )));
        }
        if let Some((build_type, _)) = self
            .builder_images
            .iter()
            .find(|(build_type, image)| build_type.trim().is_empty() || image.trim().is_empty())
        {
            return Err(Error::invalid_config(format!(
                "builder image mapping for '{build_type}' is empty"
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON, YAML or TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(kiln_core::read_document(path)?)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay `KILN_SYSTEM_NAMESPACE`, `KILN_DEFAULT_PORT` and
    /// `KILN_BUILDER_IMAGES` (`type=image,type=image`) onto this configuration.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(namespace) = lookup("KILN_SYSTEM_NAMESPACE").filter_blank() {
            self.system_namespace = namespace;
        }

        if let Some(port) = lookup("KILN_DEFAULT_PORT").filter_blank() {
            match port.trim().parse() {
                Ok(port) => self.default_port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring KILN_DEFAULT_PORT"),
            }
        }

        if let Some(images) = lookup("KILN_BUILDER_IMAGES").filter_blank() {
            self.builder_images.extend(parse_image_pairs(&images));
        }

        self
    }
}

/// Parse `type=image,type=image`, skipping malformed pairs.
fn parse_image_pairs(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| match pair.split_once('=') {
            Some((build_type, image)) if !build_type.trim().is_empty() && !image.trim().is_empty() => {
                Some((build_type.trim().to_string(), image.trim().to_string()))
            }
            _ => {
                warn!(pair, "Ignoring malformed builder image mapping");
                None
            }
        })
}

fn default_system_namespace() -> String {
    "openshift".to_string()
}

const fn default_port() -> i32 {
    8080
}

fn default_builder_images() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "nodejs".to_string(),
        "nodeshift/centos7-s2i-nodejs:10.x".to_string(),
    )])
}
