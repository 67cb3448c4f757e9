// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! # dagc-core
//!
//! Contract types for the DAG specification compiler: the materialized
//! [`Workflow`] object every other crate in this workspace builds towards,
//! the [`error`] catalog, the polymorphic value [`decode`]rs, the
//! presence-aware [`defaults`] merge, the chain/router [`chain`] rewriter,
//! and the [`aggregate`]d error collector.
//!
//! If you only take one dependency from this workspace, take this one.

/// Error aggregation: accumulate [`error::ValidationError`]s without short-circuiting.
pub mod aggregate;
/// Chain-mode implicit dependencies and router-step lowering.
pub mod chain;
/// Build context and build options threaded through a single compile.
pub mod context;
/// Presence-aware merge of DAG-level step defaults into each step.
pub mod defaults;
/// Polymorphic value decoders for union-typed surface fields.
pub mod decode;
/// Duration parsing and serde helpers.
pub mod duration;
/// The error catalog.
pub mod error;

use std::collections::BTreeMap;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use error::{ErrorCode, ValidationError};

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The materialized, validated workflow object the compiler produces.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Workflow {
    /// Workflow name. Must satisfy identifier rules when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Logical grouping, purely advisory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default working directory for steps that don't set their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Dependency semantics: implicit (`chain`) or explicit (`graph`).
    #[serde(default)]
    pub workflow_type: WorkflowType,
    /// Steps in declaration order.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Lifecycle event handlers.
    #[serde(default)]
    pub handlers: Handlers,
    /// Cron schedules that start a run.
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    /// Cron schedules that stop an active run.
    #[serde(default)]
    pub stop_schedules: Vec<Schedule>,
    /// Cron schedules that restart a run.
    #[serde(default)]
    pub restart_schedules: Vec<Schedule>,
    /// Declared parameters (name/value, positional or named).
    #[serde(default)]
    pub params: Vec<Param>,
    /// The canonical JSON form of the parameter set (see the parameter engine).
    #[serde(default)]
    pub params_json: serde_json::Value,
    /// Normalized `(key, value)` tag pairs.
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    /// Workflow-level environment, in declaration order.
    #[serde(default)]
    pub env: Vec<(String, String)>,
    /// Overall workflow timeout.
    #[serde(default, with = "duration::as_secs::option", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Named dispatch queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    /// Maximum concurrently active runs of this workflow.
    #[serde(default)]
    pub max_active_runs: i64,
    /// Maximum concurrently active steps within one run.
    #[serde(default)]
    pub max_active_steps: i64,
    /// Worker-targeting selector.
    #[serde(default)]
    pub worker_selector: WorkerSelector,
    /// `true` when `worker_selector` was the literal string `local`.
    #[serde(default)]
    pub force_local: bool,
    /// Where step stdout/stderr are written by default; empty means inherit.
    #[serde(default)]
    pub log_output: String,
    /// DAG-level container, inherited by steps with no container of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// DAG-level SSH target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfig>,
    /// DAG-level S3 artifact destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
    /// DAG-level Redis connection (queueing / locking backends).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
    /// Declared secret references (resolved by a runtime collaborator).
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
    /// OpenTelemetry export configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otel: Option<OtelConfig>,
    /// Non-fatal build warnings (deprecations, advisory notes).
    #[serde(default)]
    pub build_warnings: Vec<BuildWarning>,
    /// Build errors, populated only when the caller set `AllowBuildErrors`.
    #[serde(default)]
    pub build_errors: Vec<ValidationError>,
}

/// Dependency semantics for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Explicit `depends` edges; router steps and fan-in/fan-out are allowed.
    Graph,
    /// Implicit `Depends[prev-step]` edges injected by declaration order.
    #[default]
    Chain,
}

/// A non-fatal advisory emitted during compilation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BuildWarning {
    /// Dot-delimited path to the field the warning concerns.
    pub field: String,
    /// Human-readable advisory text.
    pub message: String,
}

/// Lifecycle-event handler steps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Handlers {
    /// Runs once before any step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Step>,
    /// Runs once after the run finishes, regardless of outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<Step>,
    /// Runs when the run finishes successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Step>,
    /// Runs when the run finishes with a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Step>,
    /// Runs when the run is cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<Step>,
    /// Runs while the run is parked awaiting external input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<Step>,
}

impl Handlers {
    /// Iterate over every populated handler step, paired with its slot name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Step)> {
        [
            ("init", &self.init),
            ("exit", &self.exit),
            ("success", &self.success),
            ("failure", &self.failure),
            ("cancel", &self.cancel),
            ("wait", &self.wait),
        ]
        .into_iter()
        .filter_map(|(name, step)| step.as_ref().map(|s| (name, s)))
    }
}

/// A declared or resolved parameter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Param {
    /// Parameter name. Positional parameters get the implicit name `$i`.
    pub name: String,
    /// Parameter value, as a string (raw JSON parameters bypass this).
    pub value: String,
    /// `true` when this parameter had no `KEY=` prefix in the surface form.
    pub positional: bool,
}

// ---------------------------------------------------------------------------
// Worker selector
// ---------------------------------------------------------------------------

/// How a step or workflow targets a remote worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerSelector {
    /// No selector: scheduler default placement.
    #[default]
    None,
    /// Label map a worker must satisfy to accept the step.
    Labels(Vec<(String, String)>),
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A single unit of execution within a [`Workflow`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Step {
    /// Step name, unique within the workflow.
    pub name: String,
    /// Optional stable identifier, distinct from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Names of steps this step depends on.
    #[serde(default)]
    pub depends: Vec<String>,
    /// `true` when the surface document explicitly declared an empty
    /// `depends: []`, marking this step as a deliberate fan-in root.
    #[serde(default)]
    pub explicitly_no_deps: bool,
    /// The step's command form, when it is a command/script executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSpec>,
    /// Working directory the step's process starts in; relative paths
    /// resolve against the build's base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// The resolved executor.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Per-step container override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// Sub-workflow invocation (`call`/legacy `run`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dag: Option<SubDag>,
    /// Parallel fan-out specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelSpec>,
    /// Router specification, graph mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<Router>,
    /// Retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    /// Repeat policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_policy: Option<RepeatPolicy>,
    /// Which non-zero outcomes still allow downstream steps to proceed.
    #[serde(default)]
    pub continue_on: ContinueOn,
    /// Preconditions gating execution.
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    /// Step-level environment, in declaration order.
    #[serde(default)]
    pub env: Vec<(String, String)>,
    /// Output variable descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputDescriptor>,
    /// Stdout redirection target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Stderr redirection target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Shell used to interpret `Script`/multi-command forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Extra arguments passed to the shell.
    #[serde(default)]
    pub shell_args: Vec<String>,
    /// Signal sent to the step process on stop, if not the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_on_stop: Option<String>,
    /// Per-step worker selector override.
    #[serde(default)]
    pub worker_selector: WorkerSelector,
    /// Per-step timeout.
    #[serde(default, with = "duration::as_secs::option", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Per-step log output override; empty means inherit.
    #[serde(default)]
    pub log_output: String,
    /// Whether to send a notification mail when this step errors.
    #[serde(default)]
    pub mail_on_error: bool,
}

/// The step's command/script form, pre-executor-dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunSpec {
    /// One or more tokenized commands.
    Commands(Vec<CommandSpec>),
    /// A multi-line script body.
    Script(String),
}

/// A single tokenized command.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to execute.
    pub command: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// The original, untokenized `command args...` string.
    pub cmd_with_args: String,
}

/// The resolved executor for a step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Executor type name (e.g. `"shell"`, `"container"`, `"ssh"`, `"jq"`).
    pub executor_type: String,
    /// Executor-specific configuration, opaque to the compiler.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            executor_type: "command".to_string(),
            config: serde_json::Value::Null,
        }
    }
}

/// A sub-workflow invocation (`call`, or legacy `run`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SubDag {
    /// Name of the sub-workflow to invoke.
    pub name: String,
    /// Parameters passed to the sub-workflow, pre-stringified by the
    /// parameter engine.
    #[serde(default)]
    pub params: String,
}

/// Parallel fan-out over a list of items.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ParallelSpec {
    /// Items to fan out over (each becomes one sub-invocation).
    pub items: Vec<String>,
    /// Maximum number of concurrent sub-invocations; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
}

/// Retry policy for a failed step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RetryPolicy {
    /// Maximum retry attempts, when given as a literal integer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Maximum retry attempts, when given as a deferred expression
    /// (`$VAR`) left for the runtime to resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_str: Option<String>,
    /// Delay between attempts.
    #[serde(with = "duration::as_secs")]
    pub interval: Duration,
    /// Exit codes that trigger a retry; empty means any non-zero exit.
    #[serde(default)]
    pub exit_codes: Vec<i32>,
    /// Multiplicative backoff factor; must be `>= 1.0` when set.
    #[serde(default)]
    pub backoff: f64,
    /// Upper bound on the backoff-expanded interval.
    #[serde(default, with = "duration::as_secs::option", skip_serializing_if = "Option::is_none")]
    pub max_interval: Option<Duration>,
}

/// Direction a [`RepeatPolicy`] repeats towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Keep repeating while the condition/exit-code match holds.
    While,
    /// Keep repeating until the condition/exit-code match holds.
    Until,
}

/// Repeat policy for a step that should re-run based on its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RepeatPolicy {
    /// Termination direction.
    pub mode: RepeatMode,
    /// Condition expression to evaluate, if exit codes aren't used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Exit codes to match against, if a condition isn't used.
    #[serde(default)]
    pub exit_codes: Vec<i32>,
    /// Delay between repeats.
    #[serde(with = "duration::as_secs")]
    pub interval: Duration,
    /// Maximum repeat count; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Multiplicative backoff factor.
    #[serde(default)]
    pub backoff: f64,
    /// Upper bound on the backoff-expanded interval.
    #[serde(default, with = "duration::as_secs::option", skip_serializing_if = "Option::is_none")]
    pub max_interval: Option<Duration>,
}

/// Controls whether downstream steps proceed after a non-success outcome.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct ContinueOn {
    /// Continue even if the step failed.
    #[serde(default)]
    pub failure: bool,
    /// Continue even if the step was skipped (its preconditions did not hold).
    #[serde(default)]
    pub skipped: bool,
    /// Continue when the step's exit code is in this list.
    #[serde(default)]
    pub exit_codes: Vec<i32>,
    /// Continue when stdout/stderr matches one of these patterns.
    #[serde(default)]
    pub output_patterns: Vec<String>,
}

/// A single gating condition on a step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Precondition {
    /// Expression to evaluate (may itself be a deferred `$VAR`/command substitution).
    pub condition: String,
    /// Expected value/pattern the condition must match for the step to run.
    pub expected: String,
}

/// Where a step's output is captured.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Name of the output variable.
    pub name: String,
    /// Key to extract from structured (e.g. JSON) output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// When `true`, the output is computed but not persisted.
    #[serde(default)]
    pub omit: bool,
}

/// A router step's conditional fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Router {
    /// Expression whose value selects a route.
    pub value: String,
    /// Candidate routes, in declaration order.
    pub routes: Vec<Route>,
}

/// One candidate route of a [`Router`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Route {
    /// Value pattern this route matches.
    pub pattern: String,
    /// Step names activated when this route matches.
    pub targets: Vec<String>,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Catch-up policy for missed cron ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Catchup {
    /// Do not replay missed ticks.
    #[default]
    Off,
    /// Replay only the most recent missed tick.
    Latest,
    /// Replay every missed tick within the window.
    All,
}

/// A single cron schedule entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Schedule {
    /// The original five-field cron expression.
    pub expression: String,
    /// The canonical, re-serialized form of the parsed expression.
    pub parsed: String,
    /// Catch-up policy.
    #[serde(default)]
    pub catchup: Catchup,
    /// Catch-up replay window; zero when `catchup` is `Off`.
    #[serde(with = "duration::as_secs")]
    pub catchup_window: Duration,
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Container startup semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Startup {
    /// Use the image's entrypoint.
    #[default]
    Entrypoint,
    /// Override with an explicit command.
    Command,
    /// Start a sleep/keepalive process; steps exec into the running container.
    Keepalive,
}

/// What a step waits for before it is considered ready to receive work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitFor {
    /// Container process is running.
    #[default]
    Running,
    /// Container health check reports healthy.
    Healthy,
}

/// Image pull policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PullPolicy {
    /// Always pull before starting.
    Always,
    /// Pull only if the image is not already present locally.
    #[default]
    Missing,
    /// Never pull; the image must already exist locally.
    Never,
}

/// Health check definition for a created container.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Healthcheck {
    /// Command run inside the container to probe health.
    pub test: Vec<String>,
    /// Delay between probes.
    #[serde(with = "duration::as_secs")]
    pub interval: Duration,
    /// Per-probe timeout.
    #[serde(with = "duration::as_secs")]
    pub timeout: Duration,
    /// Consecutive failures before the container is considered unhealthy.
    pub retries: u32,
}

/// Either create a new container from an image, or attach to an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSource {
    /// Create a new container from this image.
    Image(String),
    /// Attach to an already-running container by name.
    Exec(String),
}

/// A container execution environment, attached at the DAG or step level.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Container {
    /// Image to create from, or existing container to attach to.
    pub source: ContainerSource,
    /// Container-scoped environment.
    #[serde(default)]
    pub env: Vec<(String, String)>,
    /// Volume mounts (`host:container[:mode]`).
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Published ports (`host:container[/proto]`).
    #[serde(default)]
    pub ports: Vec<String>,
    /// Startup semantics. Creation-only: rejected in `Exec` mode.
    #[serde(default)]
    pub startup: Startup,
    /// Readiness condition. Creation-only: rejected in `Exec` mode.
    #[serde(default)]
    pub wait_for: WaitFor,
    /// Health check. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,
    /// Pull policy. Creation-only: rejected in `Exec` mode.
    #[serde(default)]
    pub pull_policy: PullPolicy,
    /// Explicit container name. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Network to attach to. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Target platform (`linux/amd64`, ...). Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Explicit startup command. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Log line pattern marking readiness. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_pattern: Option<String>,
    /// Container restart policy. Creation-only: rejected in `Exec` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
    /// Keep the container alive after the run finishes. Creation-only.
    #[serde(default)]
    pub keep_container: bool,
}

impl Container {
    /// Names of the fields valid only when creating a new container, i.e.
    /// rejected when [`ContainerSource::Exec`] is used.
    #[must_use]
    pub fn creation_only_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.pull_policy != PullPolicy::default() {
            fields.push("pull_policy");
        }
        if !self.volumes.is_empty() {
            fields.push("volumes");
        }
        if !self.ports.is_empty() {
            fields.push("ports");
        }
        if self.network.is_some() {
            fields.push("network");
        }
        if self.platform.is_some() {
            fields.push("platform");
        }
        if self.startup != Startup::default() {
            fields.push("startup");
        }
        if self.command.is_some() {
            fields.push("command");
        }
        if self.wait_for != WaitFor::default() {
            fields.push("wait_for");
        }
        if self.log_pattern.is_some() {
            fields.push("log_pattern");
        }
        if self.restart_policy.is_some() {
            fields.push("restart_policy");
        }
        if self.keep_container {
            fields.push("keep_container");
        }
        if self.healthcheck.is_some() {
            fields.push("healthcheck");
        }
        fields
    }

    /// `true` when this container attaches to an existing container rather
    /// than creating a new one.
    #[must_use]
    pub fn is_exec(&self) -> bool {
        matches!(self.source, ContainerSource::Exec(_))
    }
}

// ---------------------------------------------------------------------------
// Auxiliary connection configs
// ---------------------------------------------------------------------------

/// SSH executor target.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SshConfig {
    /// Remote host.
    pub host: String,
    /// SSH port.
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Remote user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Path to a private key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

fn default_ssh_port() -> u16 {
    22
}

/// S3 artifact destination.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix under the bucket.
    #[serde(default)]
    pub prefix: String,
    /// Region override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Redis connection, used for queueing and distributed locking.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RedisConfig {
    /// Connection URL, `$VAR`-deferrable.
    pub url: String,
    /// Key prefix for this workflow's entries.
    #[serde(default)]
    pub prefix: String,
}

/// A reference to a secret resolved by a runtime collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SecretRef {
    /// Environment variable name the secret is exposed as.
    pub env: String,
    /// Provider-qualified reference (e.g. `vault://path#field`).
    pub reference: String,
}

/// OpenTelemetry export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OtelConfig {
    /// OTLP endpoint.
    pub endpoint: String,
    /// Additional resource attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_default_type_is_chain() {
        assert_eq!(Workflow::default().workflow_type, WorkflowType::Chain);
    }

    #[test]
    fn container_creation_fields_empty_for_bare_exec() {
        let c = Container {
            source: ContainerSource::Exec("existing".into()),
            env: vec![],
            volumes: vec![],
            ports: vec![],
            startup: Startup::default(),
            wait_for: WaitFor::default(),
            healthcheck: None,
            pull_policy: PullPolicy::default(),
            name: None,
            network: None,
            platform: None,
            command: None,
            log_pattern: None,
            restart_policy: None,
            keep_container: false,
        };
        assert!(c.creation_only_fields().is_empty());
        assert!(c.is_exec());
    }

    #[test]
    fn container_creation_fields_flagged_with_exec_and_healthcheck() {
        let c = Container {
            source: ContainerSource::Exec("existing".into()),
            env: vec![],
            volumes: vec![],
            ports: vec![],
            startup: Startup::default(),
            wait_for: WaitFor::default(),
            healthcheck: Some(Healthcheck {
                test: vec!["curl".into()],
                interval: Duration::from_secs(5),
                timeout: Duration::from_secs(1),
                retries: 3,
            }),
            pull_policy: PullPolicy::default(),
            name: None,
            network: None,
            platform: None,
            command: None,
            log_pattern: None,
            restart_policy: None,
            keep_container: false,
        };
        assert_eq!(c.creation_only_fields(), vec!["healthcheck"]);
    }

    #[test]
    fn handlers_iter_skips_absent_slots() {
        let mut h = Handlers::default();
        h.exit = Some(Step {
            name: "cleanup".into(),
            ..Default::default()
        });
        let names: Vec<_> = h.iter().map(|(slot, _)| slot).collect();
        assert_eq!(names, vec!["exit"]);
    }
}
