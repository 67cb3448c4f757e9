// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sources a JSON Schema can be loaded from.

use std::path::{Path, PathBuf};

use dagc_core::{ErrorCode, ValidationError};

/// Something that can produce a parsed JSON Schema document.
pub trait SchemaSource {
    /// Load and parse the schema.
    ///
    /// # Errors
    /// `SchemaLoadFailure` if the source cannot be read or does not parse
    /// as JSON.
    fn load(&self) -> Result<serde_json::Value, ValidationError>;
}

/// Load a schema from a local file.
#[derive(Debug, Clone)]
pub struct FileSchemaSource {
    path: PathBuf,
}

impl FileSchemaSource {
    /// Reference a schema file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SchemaSource for FileSchemaSource {
    fn load(&self) -> Result<serde_json::Value, ValidationError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            ValidationError::new(
                "params_schema",
                ErrorCode::SchemaLoadFailure,
                format!("reading '{}': {e}", self.path.display()),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ValidationError::new(
                "params_schema",
                ErrorCode::SchemaLoadFailure,
                format!("parsing '{}': {e}", self.path.display()),
            )
        })
    }
}

/// Load a schema from an HTTP(S) URL. Requires the `schema-http` feature.
#[cfg(feature = "schema-http")]
#[derive(Debug, Clone)]
pub struct UrlSchemaSource {
    url: String,
}

#[cfg(feature = "schema-http")]
impl UrlSchemaSource {
    /// Reference a schema served at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "schema-http")]
impl SchemaSource for UrlSchemaSource {
    fn load(&self) -> Result<serde_json::Value, ValidationError> {
        let load_error = |e: reqwest::Error| {
            ValidationError::new(
                "params_schema",
                ErrorCode::SchemaLoadFailure,
                format!("fetching '{}': {e}", self.url),
            )
        };
        reqwest::blocking::get(&self.url)
            .map_err(load_error)?
            .json::<serde_json::Value>()
            .map_err(load_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_reports_missing_file() {
        let source = FileSchemaSource::new("/nonexistent/schema.json");
        let err = source.load().unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaLoadFailure);
    }

    #[test]
    fn file_source_loads_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();
        let source = FileSchemaSource::new(&path);
        assert_eq!(source.load().unwrap(), serde_json::json!({"type": "object"}));
    }
}
