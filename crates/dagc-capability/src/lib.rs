// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! Executor capability registry and gate.
//!
//! Every executor type supports a fixed set of [`Capability`]s. The step
//! compiler asks [`gate`] which of a candidate step's populated fields the
//! resolved executor does not support; anything it flags becomes an
//! `UnsupportedByExecutor` error rather than a silently ignored field.

use serde::{Deserialize, Serialize};

use dagc_core::{ErrorCode, ValidationError};

/// A single capability an executor may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Can run a retry policy.
    Retry,
    /// Can run a repeat policy.
    Repeat,
    /// Can attach a container.
    Container,
    /// Can redirect stdout/stderr to a file.
    OutputRedirect,
    /// Can be targeted by a worker selector.
    WorkerSelector,
    /// Honors a step timeout.
    Timeout,
    /// Can capture a named output variable.
    Output,
    /// Can be gated by preconditions.
    Preconditions,
    /// Accepts an environment map.
    Env,
    /// Runs through a configurable shell.
    Shell,
    /// Can fan out over a parallel item list.
    Parallel,
    /// Can run more than one command in a single step.
    MultipleCommands,
}

/// Outcome of checking one step's populated fields against its executor's
/// capability set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateResult {
    /// Capabilities the step used that its executor does support.
    pub satisfied: Vec<Capability>,
    /// Capabilities the step used that its executor does not support, paired
    /// with the field name that triggered the check.
    pub unsupported: Vec<(Capability, &'static str)>,
}

impl GateResult {
    /// `true` when every checked capability was satisfied.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// Turn every unsupported entry into an `UnsupportedByExecutor`
    /// [`ValidationError`], scoped under `step_field_prefix`.
    #[must_use]
    pub fn into_errors(self, step_field_prefix: &str) -> Vec<ValidationError> {
        self.unsupported
            .into_iter()
            .map(|(cap, field)| {
                ValidationError::new(
                    format!("{step_field_prefix}.{field}"),
                    ErrorCode::UnsupportedByExecutor,
                    format!("executor does not support {cap:?}"),
                )
            })
            .collect()
    }
}

/// The capability set a named executor type provides.
///
/// Unknown executor types are treated as providing no capabilities at all —
/// the step compiler is expected to have already rejected an unrecognized
/// `executor_type` before the gate runs.
#[must_use]
pub fn capabilities_of(executor_type: &str) -> &'static [Capability] {
    use Capability::{
        Container, Env, MultipleCommands, Output, OutputRedirect, Parallel, Preconditions, Repeat,
        Retry, Shell, Timeout, WorkerSelector,
    };
    match executor_type {
        "command" => &[
            Retry,
            Repeat,
            OutputRedirect,
            WorkerSelector,
            Timeout,
            Output,
            Preconditions,
            Env,
            Shell,
            Parallel,
            MultipleCommands,
        ],
        "container" => &[
            Retry,
            Repeat,
            Container,
            OutputRedirect,
            WorkerSelector,
            Timeout,
            Output,
            Preconditions,
            Env,
            Parallel,
            MultipleCommands,
        ],
        "ssh" => &[Retry, Repeat, Timeout, Output, Preconditions, Env],
        "mail" => &[Retry, Preconditions, Env],
        "http" => &[Retry, Repeat, Timeout, Output, Preconditions, Env],
        "jq" => &[Output, Preconditions],
        "call" => &[Retry, WorkerSelector, Timeout, Output, Preconditions, Parallel],
        "hitl" => &[Output, Preconditions, Env],
        _ => &[],
    }
}

/// Check which of `requested` capabilities `executor_type` does not provide.
#[must_use]
pub fn gate(executor_type: &str, requested: &[(Capability, &'static str)]) -> GateResult {
    let supported = capabilities_of(executor_type);
    let mut result = GateResult::default();
    for (cap, field) in requested {
        if supported.contains(cap) {
            result.satisfied.push(*cap);
        } else {
            result.unsupported.push((*cap, field));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_executor_rejects_container() {
        let result = gate("mail", &[(Capability::Container, "container")]);
        assert!(!result.is_compatible());
        assert_eq!(result.unsupported[0].1, "container");
    }

    #[test]
    fn command_executor_supports_retry_and_env() {
        let result = gate(
            "command",
            &[(Capability::Retry, "retry_policy"), (Capability::Env, "env")],
        );
        assert!(result.is_compatible());
        assert_eq!(result.satisfied.len(), 2);
    }

    #[test]
    fn jq_executor_rejects_multiple_commands() {
        let result = gate("jq", &[(Capability::MultipleCommands, "command")]);
        assert!(!result.is_compatible());
        assert_eq!(result.unsupported[0].0, Capability::MultipleCommands);
    }

    #[test]
    fn unknown_executor_supports_nothing() {
        assert!(capabilities_of("not-a-real-executor").is_empty());
    }

    #[test]
    fn into_errors_scopes_field_under_prefix() {
        let result = gate("jq", &[(Capability::Retry, "retry_policy")]);
        let errors = result.into_errors("steps[0]");
        assert_eq!(errors[0].field, "steps[0].retry_policy");
        assert_eq!(errors[0].code, ErrorCode::UnsupportedByExecutor);
    }
}
