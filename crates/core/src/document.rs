//! Loading and rendering of structured documents.
//!
//! The format is chosen from the file extension: `.json` is JSON,
//! `.yaml`/`.yml` is YAML, anything else is TOML.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::result::Result;

/// Serialization format of a document on disk or on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Toml => write!(f, "toml"),
        }
    }
}

/// Read and deserialize a document from `path`.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] when the file is missing, [`Error::FileReadFailed`]
/// for other I/O failures, or the parse error for the detected format.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path)
        } else {
            Error::file_read_failed(path, e.to_string())
        }
    })?;

    let format = DocumentFormat::from_path(path);
    tracing::debug!(path = %path.display(), format = %format, bytes = content.len(), "Read document");
    parse_document(path, &content, format)
}

/// Deserialize `content` in the given format. `origin` is only used for error messages.
///
/// # Errors
///
/// Returns the parse error for `format`.
pub fn parse_document<T: DeserializeOwned>(
    origin: &Path,
    content: &str,
    format: DocumentFormat,
) -> Result<T> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| Error::json_parse_failed(origin, e.to_string()))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| Error::yaml_parse_failed(origin, e.to_string()))
        }
        DocumentFormat::Toml => {
            toml::from_str(content).map_err(|e| Error::toml_parse_failed(origin, e.to_string()))
        }
    }
}

/// Serialize `value` into a string in the given format.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] if the value cannot be represented in `format`.
pub fn render_document<T: Serialize>(value: &T, format: DocumentFormat) -> Result<String> {
    let rendered = match format {
        DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
    };
    rendered.map_err(|reason| Error::render_failed(format.to_string(), reason))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Write;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        images: BTreeMap<String, String>,
    }

    fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), DocumentFormat::Toml);
    }

    #[test]
    fn test_read_toml_document() {
        let file = write_temp(".toml", "name = \"x\"\n[images]\nnodejs = \"img:1\"\n");
        let sample: Sample = read_document(file.path()).unwrap();
        assert_eq!(sample.name, "x");
        assert_eq!(sample.images.get("nodejs").map(String::as_str), Some("img:1"));
    }

    #[test]
    fn test_read_yaml_document() {
        let file = write_temp(".yaml", "name: y\n");
        let sample: Sample = read_document(file.path()).unwrap();
        assert_eq!(sample.name, "y");
        assert!(sample.images.is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let result: Result<Sample> = read_document(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_read_malformed_json() {
        let file = write_temp(".json", "{ not json");
        let result: Result<Sample> = read_document(file.path());
        assert!(matches!(result, Err(Error::JsonParseFailed { .. })));
    }

    #[test]
    fn test_render_json() {
        let sample = Sample {
            name: "z".to_string(),
            images: BTreeMap::new(),
        };
        let out = render_document(&sample, DocumentFormat::Json).unwrap();
        assert!(out.contains("\"name\": \"z\""));
    }
}
