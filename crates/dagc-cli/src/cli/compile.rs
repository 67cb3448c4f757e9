// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared document-loading and compile-context wiring for `build` and `validate`.

use anyhow::{Context, Result};

use dagc_core::context::{BuildContext, BuildOptions, Flag};
use dagc_core::Workflow;
use dagc_params::FileSchemaSource;

use super::prefs::{load_preferences, resolve_input};
use super::CompileArgs;

/// Load the surface document (and optional base overlay) and compile it,
/// threading `--parameters`/`--parameters-list`/`--param` through
/// [`BuildContext`] as the `Parameters`/`ParametersList` build options so any
/// caller of `dagc_dag::build` gets the same override behavior.
pub fn load_and_build(args: &CompileArgs) -> Result<Workflow> {
    let prefs = load_preferences(args.config.as_deref())?;
    let input = resolve_input(&args.input, prefs.document_dir.as_deref());

    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading '{}'", input.display()))?;
    let doc: serde_yaml::Value =
        serde_yaml::from_str(&text).with_context(|| format!("parsing '{}'", input.display()))?;

    let base_dir = input.parent().map(std::path::Path::to_path_buf).unwrap_or_default();

    let mut options = BuildOptions::new();
    if args.no_eval || prefs.no_eval {
        options = options.with(Flag::NoEval);
    }
    if args.only_metadata || prefs.only_metadata {
        options = options.with(Flag::OnlyMetadata);
    }
    if args.allow_build_errors || prefs.allow_build_errors {
        options = options.with(Flag::AllowBuildErrors);
    }
    if args.skip_schema_validation || prefs.skip_schema_validation {
        options = options.with(Flag::SkipSchemaValidation);
    }

    let mut ctx = BuildContext::new(base_dir).with_options(options);

    if let Some(name) = &args.name {
        ctx = ctx.with_name_override(name.clone());
    }
    if let Some(dir) = &args.default_working_dir {
        ctx = ctx.with_default_working_dir(dir.clone());
    }
    if !args.build_env.is_empty() {
        let pairs = args
            .build_env
            .iter()
            .map(|raw| {
                raw.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| anyhow::anyhow!("--build-env expects KEY=VALUE, got '{raw}'"))
            })
            .collect::<Result<_>>()?;
        ctx = ctx.with_build_env(pairs);
    }

    if let Some(base_config_path) = &args.base_config {
        let overlay_text = std::fs::read_to_string(base_config_path)
            .with_context(|| format!("reading '{}'", base_config_path.display()))?;
        let overlay: serde_yaml::Value = serde_yaml::from_str(&overlay_text)
            .with_context(|| format!("parsing '{}'", base_config_path.display()))?;
        ctx = ctx.with_base_overlay(overlay);
    }

    if let Some(parameters) = &args.parameters {
        ctx = ctx.with_parameters(parameters.clone());
    }

    // `--param KEY=VALUE` entries fold into `parameters_list` as additional
    // `KEY=VALUE` override strings, applied after `--parameters-list` in
    // command-line order.
    let mut parameters_list = args.parameters_list.clone();
    parameters_list.extend(args.params.iter().cloned());
    if !parameters_list.is_empty() {
        ctx = ctx.with_parameters_list(parameters_list);
    }

    let schema_source = args.params_schema.as_ref().map(FileSchemaSource::new);
    let schema_ref: Option<&dyn dagc_params::SchemaSource> =
        schema_source.as_ref().map(|s| s as &dyn dagc_params::SchemaSource);

    let workflow = dagc_dag::build(&doc, &ctx, schema_ref).map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(workflow)
}
