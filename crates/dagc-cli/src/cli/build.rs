// SPDX-License-Identifier: MIT OR Apache-2.0
//! `dagc build`: compile a surface document and print the resolved workflow.

use std::process::ExitCode;

use anyhow::Result;
use tracing::info;

use super::compile::load_and_build;
use super::CompileArgs;

/// Arguments to `dagc build`.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub compile: CompileArgs,
}

/// Run `dagc build`.
pub fn run(args: Args) -> Result<ExitCode> {
    let workflow = load_and_build(&args.compile)?;
    info!(
        name = workflow.name.as_deref().unwrap_or("<unnamed>"),
        steps = workflow.steps.len(),
        "compiled workflow"
    );
    println!("{}", serde_json::to_string_pretty(&workflow)?);
    if workflow.build_errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
