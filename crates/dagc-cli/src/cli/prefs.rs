// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loading of `dagc.toml`, a small CLI-preferences file read from the
//! current directory (or an explicit `--config` path) ahead of command-line
//! flags — a document directory default and default build flags, following
//! `abp-config`'s TOML-loading pattern.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors loading or parsing a `dagc.toml` preferences file.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// The explicitly-requested preferences file does not exist.
    #[error("preferences file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },
    /// The file could not be parsed as valid TOML.
    #[error("failed to parse {path}: {reason}")]
    ParseError {
        /// Path of the file that failed to parse.
        path: String,
        /// Human-readable parse error detail.
        reason: String,
    },
}

/// CLI-wide preferences loaded from `dagc.toml`.
///
/// Every field is a default a command-line flag can still override; this
/// file only saves a caller from repeating the same flags on every
/// invocation.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliPreferences {
    /// Directory a relative `input` path (with no directory component of
    /// its own) resolves against, in place of the current directory.
    pub document_dir: Option<PathBuf>,
    /// Default for `--no-eval`.
    pub no_eval: bool,
    /// Default for `--only-metadata`.
    pub only_metadata: bool,
    /// Default for `--allow-build-errors`.
    pub allow_build_errors: bool,
    /// Default for `--skip-schema-validation`.
    pub skip_schema_validation: bool,
}

/// Load preferences from an explicit path, or `./dagc.toml` when `None` and
/// the file happens to exist there.
///
/// A missing `./dagc.toml` is not an error — callers get
/// [`CliPreferences::default`]. An explicitly-named path that is missing
/// *is* an error.
///
/// # Errors
/// [`PrefsError::FileNotFound`] for a missing explicit path,
/// [`PrefsError::ParseError`] for invalid TOML.
pub fn load_preferences(explicit_path: Option<&Path>) -> Result<CliPreferences, PrefsError> {
    match explicit_path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|_| PrefsError::FileNotFound {
                path: path.display().to_string(),
            })?;
            parse_toml(&content, path)
        }
        None => {
            let default_path = Path::new("dagc.toml");
            match std::fs::read_to_string(default_path) {
                Ok(content) => parse_toml(&content, default_path),
                Err(_) => Ok(CliPreferences::default()),
            }
        }
    }
}

fn parse_toml(content: &str, path: &Path) -> Result<CliPreferences, PrefsError> {
    toml::from_str(content).map_err(|e| PrefsError::ParseError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `input` against `document_dir` when `input` has no directory
/// component of its own (i.e. it names a file expected to live in whatever
/// a caller considers "the" document directory).
#[must_use]
pub fn resolve_input(input: &Path, document_dir: Option<&Path>) -> PathBuf {
    match document_dir {
        Some(dir) if input.parent().is_some_and(|p| p.as_os_str().is_empty()) => dir.join(input),
        _ => input.to_path_buf(),
    }
}
