// SPDX-License-Identifier: MIT OR Apache-2.0
//! `dagc schema`: print the JSON Schema for the compiled workflow shape.

use std::process::ExitCode;

use anyhow::Result;
use schemars::schema_for;

use dagc_core::Workflow;

/// Arguments to `dagc schema` (currently none).
#[derive(Debug, clap::Args)]
pub struct Args {}

/// Run `dagc schema`.
pub fn run(_args: Args) -> Result<ExitCode> {
    let schema = schema_for!(Workflow);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(ExitCode::SUCCESS)
}
