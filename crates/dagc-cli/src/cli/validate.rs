// SPDX-License-Identifier: MIT OR Apache-2.0
//! `dagc validate`: compile a surface document and report success or failure only.

use std::process::ExitCode;

use anyhow::Result;

use super::compile::load_and_build;
use super::CompileArgs;

/// Arguments to `dagc validate`.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub compile: CompileArgs,
}

/// Run `dagc validate`.
pub fn run(mut args: Args) -> Result<ExitCode> {
    args.compile.only_metadata = true;
    match load_and_build(&args.compile) {
        Ok(workflow) if workflow.build_errors.is_empty() => {
            println!("ok: {} step(s)", workflow.steps.len());
            Ok(ExitCode::SUCCESS)
        }
        Ok(workflow) => {
            for e in &workflow.build_errors {
                println!("error: {e}");
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            println!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
