// SPDX-License-Identifier: MIT OR Apache-2.0
//! CLI argument definitions and subcommand entry points.

pub mod build;
mod compile;
pub mod prefs;
pub mod schema;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Front-end compiler for DAG workflow specifications.
#[derive(Debug, Parser)]
#[command(name = "dagc", version, about)]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, single-line-per-event output.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a surface document into a validated workflow.
    Build(build::Args),
    /// Compile a surface document and report success or failure only.
    Validate(validate::Args),
    /// Print the JSON Schema for the compiled workflow shape.
    Schema(schema::Args),
}

/// Flags shared by `build` and `validate`.
#[derive(Debug, clap::Args)]
pub struct CompileArgs {
    /// Path to the surface YAML document.
    pub input: PathBuf,

    /// Path to a `dagc.toml` CLI-preferences file, in place of `./dagc.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to an optional base-config overlay document.
    #[arg(long)]
    pub base_config: Option<PathBuf>,

    /// Override the compiled workflow's name regardless of the document.
    #[arg(long)]
    pub name: Option<String>,

    /// Fallback working directory used when the document sets none.
    #[arg(long)]
    pub default_working_dir: Option<String>,

    /// `KEY=VALUE` env pairs prepended ahead of the document's own `env`, may be repeated.
    #[arg(long = "build-env", value_name = "KEY=VALUE")]
    pub build_env: Vec<String>,

    /// A single shell-like parameter override string (`KEY=VALUE KEY2=VALUE2`).
    #[arg(long)]
    pub parameters: Option<String>,

    /// A shell-like parameter override string, may be repeated; applied in order after `--parameters`.
    #[arg(long = "parameters-list", value_name = "KEY=VALUE ...")]
    pub parameters_list: Vec<String>,

    /// `KEY=VALUE` parameter overrides, may be repeated.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Path to a JSON Schema file to validate resolved parameters against.
    #[arg(long)]
    pub params_schema: Option<PathBuf>,

    /// Stop after decoding the surface document; run no transformer.
    #[arg(long)]
    pub no_eval: bool,

    /// Compile only the metadata tier; skip step compilation.
    #[arg(long)]
    pub only_metadata: bool,

    /// Continue past validation errors instead of failing the command.
    #[arg(long)]
    pub allow_build_errors: bool,

    /// Skip JSON-Schema parameter validation even if `--params-schema` is set.
    #[arg(long)]
    pub skip_schema_validation: bool,
}
