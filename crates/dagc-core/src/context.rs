// SPDX-License-Identifier: MIT OR Apache-2.0
//! Build context: the options threaded through a single compile.
//!
//! A [`BuildContext`] is created once per `build()` call and passed by
//! reference to every transformer in the metadata and full tiers. It never
//! carries mutable state of its own — the [`crate::aggregate::ErrorAggregator`]
//! the caller owns is threaded separately — it only carries the flags that
//! change how individual transformers behave.

use std::path::PathBuf;

/// A single behavior-changing flag passed to [`BuildContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Stop after decoding the surface document; never run a transformer.
    NoEval,
    /// Run only the metadata tier (name, tags, schedules, params); skip steps.
    OnlyMetadata,
    /// Continue compiling after errors, attaching them to `Workflow::build_errors`
    /// instead of returning early.
    AllowBuildErrors,
    /// Skip JSON-Schema parameter validation even if a schema is configured.
    SkipSchemaValidation,
}

/// The options a single `build()` call runs under.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    no_eval: bool,
    only_metadata: bool,
    allow_build_errors: bool,
    skip_schema_validation: bool,
}

impl BuildOptions {
    /// Start from an empty option set (every flag off).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, builder-style.
    #[must_use]
    pub fn with(mut self, flag: Flag) -> Self {
        match flag {
            Flag::NoEval => self.no_eval = true,
            Flag::OnlyMetadata => self.only_metadata = true,
            Flag::AllowBuildErrors => self.allow_build_errors = true,
            Flag::SkipSchemaValidation => self.skip_schema_validation = true,
        }
        self
    }

    /// `true` when [`Flag::NoEval`] was set.
    #[must_use]
    pub fn no_eval(&self) -> bool {
        self.no_eval
    }

    /// `true` when [`Flag::OnlyMetadata`] was set.
    #[must_use]
    pub fn only_metadata(&self) -> bool {
        self.only_metadata
    }

    /// `true` when [`Flag::AllowBuildErrors`] was set.
    #[must_use]
    pub fn allow_build_errors(&self) -> bool {
        self.allow_build_errors
    }

    /// `true` when [`Flag::SkipSchemaValidation`] was set.
    #[must_use]
    pub fn skip_schema_validation(&self) -> bool {
        self.skip_schema_validation
    }
}

/// Per-compile context: options plus the base directory relative paths
/// (working directories, schema file references) resolve against.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The options this compile runs under.
    pub options: BuildOptions,
    /// Directory the surface document was loaded from, used to resolve
    /// relative `working_dir` and local schema file references.
    pub base_dir: PathBuf,
    /// Optional shared base-config overlay, decoded once and merged into
    /// every workflow's metadata tier ahead of its own fields. See
    /// [`crate::defaults::apply_base_overlay`].
    pub base_overlay: Option<serde_yaml::Value>,
    /// Caller-supplied workflow name, overriding whatever the document
    /// itself declares (or lack thereof).
    pub name_override: Option<String>,
    /// Fallback `working_dir` used when the document sets none at all.
    pub default_working_dir: Option<String>,
    /// Extra env pairs prepended ahead of the document's own `env`, exactly
    /// as a document-declared default would be.
    pub build_env: Vec<(String, String)>,
    /// A single shell-like parameter override string (`KEY=VALUE KEY2=VALUE2`),
    /// applied over the document's declared parameters.
    pub parameters: Option<String>,
    /// Shell-like parameter override strings, applied in order after
    /// `parameters`. Each is parsed and merged the same way `parameters` is.
    pub parameters_list: Vec<String>,
}

impl BuildContext {
    /// Create a context with default options rooted at `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            options: BuildOptions::new(),
            base_dir: base_dir.into(),
            base_overlay: None,
            name_override: None,
            default_working_dir: None,
            build_env: Vec::new(),
            parameters: None,
            parameters_list: Vec::new(),
        }
    }

    /// Attach build options, builder-style.
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a base-config overlay, builder-style.
    #[must_use]
    pub fn with_base_overlay(mut self, overlay: serde_yaml::Value) -> Self {
        self.base_overlay = Some(overlay);
        self
    }

    /// Override the compiled workflow's name, builder-style.
    #[must_use]
    pub fn with_name_override(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Set the fallback `working_dir`, builder-style.
    #[must_use]
    pub fn with_default_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.default_working_dir = Some(dir.into());
        self
    }

    /// Attach extra env pairs, builder-style.
    #[must_use]
    pub fn with_build_env(mut self, env: Vec<(String, String)>) -> Self {
        self.build_env = env;
        self
    }

    /// Set the single `Parameters` override string, builder-style.
    #[must_use]
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Attach `ParametersList` override strings, builder-style.
    #[must_use]
    pub fn with_parameters_list(mut self, parameters_list: Vec<String>) -> Self {
        self.parameters_list = parameters_list;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_all_off() {
        let opts = BuildOptions::new();
        assert!(!opts.no_eval());
        assert!(!opts.only_metadata());
        assert!(!opts.allow_build_errors());
        assert!(!opts.skip_schema_validation());
    }

    #[test]
    fn with_sets_only_the_named_flag() {
        let opts = BuildOptions::new().with(Flag::AllowBuildErrors);
        assert!(opts.allow_build_errors());
        assert!(!opts.only_metadata());
    }

    #[test]
    fn context_defaults_to_no_overlay() {
        let ctx = BuildContext::new("/tmp");
        assert!(ctx.base_overlay.is_none());
    }

    #[test]
    fn context_defaults_to_no_parameter_overrides() {
        let ctx = BuildContext::new("/tmp");
        assert!(ctx.parameters.is_none());
        assert!(ctx.parameters_list.is_empty());
    }

    #[test]
    fn with_parameters_sets_the_override_string() {
        let ctx = BuildContext::new("/tmp").with_parameters("FOO=bar");
        assert_eq!(ctx.parameters.as_deref(), Some("FOO=bar"));
    }

    #[test]
    fn with_parameters_list_sets_the_override_strings() {
        let ctx = BuildContext::new("/tmp").with_parameters_list(vec!["FOO=bar".into(), "BAZ=qux".into()]);
        assert_eq!(ctx.parameters_list, vec!["FOO=bar".to_string(), "BAZ=qux".to_string()]);
    }
}
