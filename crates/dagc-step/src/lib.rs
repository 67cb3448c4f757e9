// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! Step compiler (component C).
//!
//! [`compile_step`] turns one surface step node into a [`dagc_core::Step`]:
//! it resolves the command/script shape, picks an executor (rejecting a
//! legacy alias with a hint rather than silently accepting it), validates
//! the container against its creation-vs-exec mode, runs the step's
//! populated fields through the capability gate for its resolved executor,
//! and builds the retry/repeat policy objects. Every problem it finds is
//! pushed to the caller's [`ErrorAggregator`]; it never returns early.

use std::path::Path;
use std::time::Duration;

use serde_yaml::Value;
use tracing::debug_span;

use dagc_build::{build_name, build_signal, build_working_dir};
use dagc_capability::{gate, Capability};
use dagc_core::decode::PolyValue;
use dagc_core::duration::parse_duration;
use dagc_core::{
    aggregate::{check_unknown_keys, ErrorAggregator}, CommandSpec, Container, ContainerSource,
    ContinueOn, ErrorCode, ExecutorConfig, Healthcheck, OutputDescriptor, ParallelSpec,
    Precondition, PullPolicy, RepeatMode, RepeatPolicy, RetryPolicy, Route, Router, RunSpec,
    Startup, Step, SubDag, ValidationError, WaitFor, WorkerSelector,
};

/// Every key a step node recognizes. Anything else is `UnknownKey`, with a
/// legacy-spelling hint attached automatically when one is known.
const KNOWN_STEP_KEYS: &[&str] = &[
    "name", "id", "working_dir", "depends", "command", "script", "type", "config", "executor",
    "container", "call", "sub_dag", "parallel", "router", "retry_policy", "repeat_policy",
    "continue_on", "preconditions", "env", "output", "stdout", "stderr", "shell", "shell_args",
    "signal_on_stop", "worker_selector", "timeout", "log_output", "mail_on_error",
];

/// Legacy executor type spellings rejected with a hint rather than accepted.
const LEGACY_EXECUTOR_ALIASES: &[(&str, &str)] = &[("docker", "container"), ("shell", "command")];

/// Known executor types. An `executor_type` outside this set produces
/// `InvalidEnum` rather than silently falling through to the capability gate
/// (which would otherwise treat every unknown executor as supporting
/// nothing, burying the real problem in a wall of `UnsupportedByExecutor`).
const KNOWN_EXECUTOR_TYPES: &[&str] =
    &["command", "container", "ssh", "mail", "http", "jq", "call", "hitl"];

/// DAG-level executor context a step's compiler consults when no executor
/// is named: a DAG-level `container` or `ssh` block changes the inferred
/// default away from the plain command executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagExecutorHints {
    /// The document declares a DAG-level `container` block.
    pub has_container: bool,
    /// The document declares a DAG-level `ssh` block.
    pub has_ssh: bool,
}

/// Compile one surface step node, scoped under `field_prefix` (e.g.
/// `"steps[2]"`), pushing every problem found to `errors`.
///
/// `base_dir` resolves a relative `working_dir` against the document's own
/// directory; it has no effect on absolute, `~`-, or `$`-prefixed paths.
pub fn compile_step(
    field_prefix: &str,
    raw: &Value,
    base_dir: &Path,
    errors: &mut ErrorAggregator,
) -> Step {
    compile_step_with_hints(field_prefix, raw, base_dir, errors, DagExecutorHints::default())
}

/// As [`compile_step`], but with DAG-level executor context for the
/// no-executor-named inference rule.
pub fn compile_step_with_hints(
    field_prefix: &str,
    raw: &Value,
    base_dir: &Path,
    errors: &mut ErrorAggregator,
    dag_hints: DagExecutorHints,
) -> Step {
    let _span = debug_span!("compile_step", prefix = %field_prefix).entered();
    let mut step = Step::default();

    check_unknown_keys(field_prefix, raw, KNOWN_STEP_KEYS, errors);

    match raw.get("name").and_then(|v| v.as_str()) {
        Some(name_raw) => match build_name(&format!("{field_prefix}.name"), name_raw) {
            Ok(name) => step.name = name,
            Err(e) => errors.push(e),
        },
        None => errors.push(ValidationError::new(
            format!("{field_prefix}.name"),
            ErrorCode::MissingRequired,
            "step name is required",
        )),
    }

    step.id = raw.get("id").and_then(|v| v.as_str()).map(String::from);
    step.working_dir = raw
        .get("working_dir")
        .and_then(|v| v.as_str())
        .and_then(|s| build_working_dir(base_dir, s));

    if let Some(depends_raw) = raw.get("depends") {
        let poly = PolyValue::decode(depends_raw);
        match poly.as_string_list(&format!("{field_prefix}.depends")) {
            Ok(list) => {
                step.explicitly_no_deps = list.is_empty() && poly.raw_kind() == dagc_core::decode::RawKind::Sequence;
                step.depends = list;
            }
            Err(e) => errors.push(e),
        }
    }

    compile_run_and_executor(field_prefix, raw, errors, &mut step, dag_hints);
    compile_container(field_prefix, raw, errors, &mut step);
    compile_sub_dag_and_parallel(field_prefix, raw, &mut step);
    compile_router(field_prefix, raw, errors, &mut step);
    compile_policies(field_prefix, raw, errors, &mut step);
    compile_continue_on_and_preconditions(field_prefix, raw, errors, &mut step);
    compile_env_and_output(field_prefix, raw, errors, &mut step);
    compile_misc(field_prefix, raw, errors, &mut step);

    gate_against_capabilities(field_prefix, &step, errors);

    step
}

fn compile_run_and_executor(
    field_prefix: &str,
    raw: &Value,
    errors: &mut ErrorAggregator,
    step: &mut Step,
    dag_hints: DagExecutorHints,
) {
    let commands_raw = raw.get("command");
    let script_raw = raw.get("script").and_then(|v| v.as_str());

    if commands_raw.is_some() && script_raw.is_some() {
        errors.push(ValidationError::new(
            format!("{field_prefix}.command"),
            ErrorCode::Conflict,
            "a step may set 'command' or 'script', not both",
        ));
    }

    if let Some(script) = script_raw {
        step.run = Some(RunSpec::Script(script.to_string()));
    } else if let Some(commands_raw) = commands_raw {
        let poly = PolyValue::decode(commands_raw);
        match poly.as_string_list(&format!("{field_prefix}.command")) {
            Ok(lines) => {
                let commands = lines
                    .into_iter()
                    .map(|line| tokenize_command(field_prefix, &line, errors))
                    .collect();
                step.run = Some(RunSpec::Commands(commands));
            }
            Err(e) => errors.push(e),
        }
    }

    // New form: top-level `type`/`config`. Legacy form: `executor` as a
    // string or a `{type, config}` mapping. The two forms are mutually
    // exclusive; within the legacy form a bare string has no `config`.
    let type_raw = raw.get("type").and_then(|v| v.as_str());
    let config_raw = raw.get("config");
    let executor_raw = raw.get("executor");

    if executor_raw.is_some() && type_raw.is_some() {
        errors.push(ValidationError::new(
            format!("{field_prefix}.type"),
            ErrorCode::Conflict,
            "a step may set 'type' or 'executor', not both",
        ));
    }
    if executor_raw.is_some() && config_raw.is_some() {
        errors.push(ValidationError::new(
            format!("{field_prefix}.config"),
            ErrorCode::Conflict,
            "a step may set 'config' or 'executor', not both",
        ));
    }

    let legacy_type = match executor_raw {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Mapping(_)) => executor_raw.and_then(|e| e.get("type")).and_then(|t| t.as_str()).map(String::from),
        Some(_) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.executor"),
                ErrorCode::InvalidShape,
                "expected a string or a mapping with a 'type' key",
            ));
            None
        }
    };

    let explicit_type = type_raw.map(String::from).or(legacy_type);

    let executor_type = explicit_type.unwrap_or_else(|| {
        if dag_hints.has_container {
            "container".to_string()
        } else if dag_hints.has_ssh {
            "ssh".to_string()
        } else {
            "command".to_string()
        }
    });

    if let Some((_, canonical)) = LEGACY_EXECUTOR_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == executor_type)
    {
        errors.push(ValidationError::new(
            format!("{field_prefix}.executor"),
            ErrorCode::InvalidEnum,
            format!("'{executor_type}' is not an executor type; did you mean '{canonical}'?"),
        ));
    } else if !KNOWN_EXECUTOR_TYPES.contains(&executor_type.as_str()) {
        errors.push(ValidationError::new(
            format!("{field_prefix}.executor"),
            ErrorCode::InvalidEnum,
            format!("unknown executor type '{executor_type}'"),
        ));
    }

    let config = config_raw
        .or_else(|| executor_raw.and_then(|e| e.get("config")))
        .map(serde_yaml_to_json)
        .unwrap_or(serde_json::Value::Null);

    step.executor = ExecutorConfig {
        executor_type,
        config,
    };
}

fn tokenize_command(field_prefix: &str, line: &str, errors: &mut ErrorAggregator) -> CommandSpec {
    let tokens = shlex::split(line);
    let (command, args) = match tokens {
        Some(mut t) if !t.is_empty() => {
            let command = t.remove(0);
            (command, t)
        }
        _ => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.command"),
                ErrorCode::InvalidShape,
                format!("could not tokenize command '{line}'"),
            ));
            (line.to_string(), Vec::new())
        }
    };
    CommandSpec {
        command,
        args,
        cmd_with_args: line.to_string(),
    }
}

fn compile_container(field_prefix: &str, raw: &Value, errors: &mut ErrorAggregator, step: &mut Step) {
    let Some(container_raw) = raw.get("container") else {
        return;
    };
    let source = match (
        container_raw.get("image").and_then(|v| v.as_str()),
        container_raw.get("exec").and_then(|v| v.as_str()),
    ) {
        (Some(image), None) => ContainerSource::Image(image.to_string()),
        (None, Some(exec)) => ContainerSource::Exec(exec.to_string()),
        (Some(_), Some(_)) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container"),
                ErrorCode::Conflict,
                "a container may set 'image' or 'exec', not both",
            ));
            return;
        }
        (None, None) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container"),
                ErrorCode::MissingRequired,
                "container requires either 'image' or 'exec'",
            ));
            return;
        }
    };

    let startup = match container_raw.get("startup").and_then(|v| v.as_str()) {
        Some("entrypoint") | None => Startup::Entrypoint,
        Some("command") => Startup::Command,
        Some("keepalive") => Startup::Keepalive,
        Some(other) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container.startup"),
                ErrorCode::InvalidEnum,
                format!("'{other}' is not a recognized startup mode"),
            ));
            Startup::Entrypoint
        }
    };
    let wait_for = match container_raw.get("wait_for").and_then(|v| v.as_str()) {
        Some("running") | None => WaitFor::Running,
        Some("healthy") => WaitFor::Healthy,
        Some(other) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container.wait_for"),
                ErrorCode::InvalidEnum,
                format!("'{other}' is not a recognized wait_for mode"),
            ));
            WaitFor::Running
        }
    };
    let pull_policy = match container_raw.get("pull_policy").and_then(|v| v.as_str()) {
        Some("always") => PullPolicy::Always,
        Some("missing") | None => PullPolicy::Missing,
        Some("never") => PullPolicy::Never,
        Some(other) => {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container.pull_policy"),
                ErrorCode::InvalidEnum,
                format!("'{other}' is not a recognized pull policy"),
            ));
            PullPolicy::Missing
        }
    };
    let healthcheck = container_raw.get("healthcheck").map(|hc_raw| {
        let test = hc_raw
            .get("test")
            .map(PolyValue::decode)
            .map(|p| p.as_string_list(&format!("{field_prefix}.container.healthcheck.test")))
            .transpose()
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            })
            .unwrap_or_default();
        let interval = hc_raw
            .get("interval")
            .and_then(|v| v.as_str())
            .map(|s| parse_duration(&format!("{field_prefix}.container.healthcheck.interval"), s))
            .transpose()
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            })
            .unwrap_or(Duration::from_secs(30));
        let timeout = hc_raw
            .get("timeout")
            .and_then(|v| v.as_str())
            .map(|s| parse_duration(&format!("{field_prefix}.container.healthcheck.timeout"), s))
            .transpose()
            .unwrap_or_else(|e| {
                errors.push(e);
                None
            })
            .unwrap_or(Duration::from_secs(5));
        let retries = hc_raw.get("retries").and_then(serde_yaml::Value::as_u64).unwrap_or(3) as u32;
        Healthcheck { test, interval, timeout, retries }
    });
    let command = container_raw
        .get("command")
        .map(PolyValue::decode)
        .map(|p| p.as_string_list(&format!("{field_prefix}.container.command")))
        .transpose()
        .unwrap_or_else(|e| {
            errors.push(e);
            None
        });

    let mut container = Container {
        source,
        env: Vec::new(),
        volumes: Vec::new(),
        ports: Vec::new(),
        startup,
        wait_for,
        healthcheck,
        pull_policy,
        name: container_raw.get("name").and_then(|v| v.as_str()).map(String::from),
        network: container_raw.get("network").and_then(|v| v.as_str()).map(String::from),
        platform: container_raw.get("platform").and_then(|v| v.as_str()).map(String::from),
        command,
        log_pattern: container_raw.get("log_pattern").and_then(|v| v.as_str()).map(String::from),
        restart_policy: container_raw.get("restart_policy").and_then(|v| v.as_str()).map(String::from),
        keep_container: container_raw
            .get("keep_container")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    };

    if let Some(env_raw) = container_raw.get("env") {
        match PolyValue::decode(env_raw).as_ordered_pairs(&format!("{field_prefix}.container.env")) {
            Ok(pairs) => container.env = pairs,
            Err(e) => errors.push(e),
        }
    }
    if let Some(volumes_raw) = container_raw.get("volumes") {
        match PolyValue::decode(volumes_raw).as_string_list(&format!("{field_prefix}.container.volumes")) {
            Ok(v) => container.volumes = v,
            Err(e) => errors.push(e),
        }
    }
    if let Some(ports_raw) = container_raw.get("ports") {
        match PolyValue::decode(ports_raw).as_string_list(&format!("{field_prefix}.container.ports")) {
            Ok(v) => container.ports = v,
            Err(e) => errors.push(e),
        }
    }

    if container.is_exec() {
        let offenders = container.creation_only_fields();
        if !offenders.is_empty() {
            errors.push(ValidationError::new(
                format!("{field_prefix}.container"),
                ErrorCode::Conflict,
                format!(
                    "field(s) {} are only valid when creating a container, not attaching via 'exec'",
                    offenders.join(", ")
                ),
            ));
        }
    }

    step.container = Some(container);
}

fn compile_sub_dag_and_parallel(field_prefix: &str, raw: &Value, step: &mut Step) {
    let _ = field_prefix;
    if let Some(call_raw) = raw.get("call").or_else(|| raw.get("sub_dag")) {
        let name = call_raw
            .get("name")
            .and_then(|v| v.as_str())
            .or_else(|| call_raw.as_str())
            .unwrap_or_default()
            .to_string();
        let params = call_raw
            .get("params")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        step.sub_dag = Some(SubDag { name, params });
    }

    if let Some(parallel_raw) = raw.get("parallel") {
        let items = PolyValue::decode(
            parallel_raw.get("items").unwrap_or(parallel_raw),
        )
        .as_string_list("parallel.items")
        .unwrap_or_default();
        let max_concurrent = parallel_raw
            .get("max_concurrent")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32);
        step.parallel = Some(ParallelSpec {
            items,
            max_concurrent,
        });
    }
}

fn compile_router(field_prefix: &str, raw: &Value, errors: &mut ErrorAggregator, step: &mut Step) {
    let Some(router_raw) = raw.get("router") else {
        return;
    };
    let value = router_raw
        .get("value")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let Some(Value::Sequence(routes_raw)) = router_raw.get("routes") else {
        errors.push(ValidationError::new(
            format!("{field_prefix}.router.routes"),
            ErrorCode::InvalidShape,
            "router.routes must be a sequence",
        ));
        return;
    };
    let mut routes = Vec::new();
    for (i, route_raw) in routes_raw.iter().enumerate() {
        let pattern = route_raw.get("pattern").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let targets = route_raw
            .get("targets")
            .map(PolyValue::decode)
            .map(|p| p.as_string_list(&format!("{field_prefix}.router.routes[{i}].targets")))
            .transpose();
        match targets {
            Ok(targets) => routes.push(Route {
                pattern,
                targets: targets.unwrap_or_default(),
            }),
            Err(e) => errors.push(e),
        }
    }
    step.router = Some(Router { value, routes });
}

fn compile_policies(field_prefix: &str, raw: &Value, errors: &mut ErrorAggregator, step: &mut Step) {
    if let Some(retry_raw) = raw.get("retry_policy") {
        let field = format!("{field_prefix}.retry_policy");
        let limit = retry_raw.get("limit");
        let (limit, limit_str) = match limit.and_then(|v| v.as_i64()) {
            Some(n) => (Some(n), None),
            None => (None, limit.and_then(|v| v.as_str()).map(String::from)),
        };
        let interval = match retry_raw.get("interval").and_then(|v| v.as_str()) {
            Some(s) => parse_duration(&format!("{field}.interval"), s).unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        };
        let exit_codes = retry_raw
            .get("exit_codes")
            .map(PolyValue::decode)
            .and_then(|p| p.as_string_list(&format!("{field}.exit_codes")).ok())
            .map(|v| v.into_iter().filter_map(|s| s.parse().ok()).collect())
            .unwrap_or_default();
        let backoff = retry_raw.get("backoff").and_then(|v| v.as_f64()).unwrap_or(1.0);
        if backoff < 1.0 {
            errors.push(ValidationError::new(&field, ErrorCode::InvalidShape, "backoff must be >= 1.0"));
        }
        step.retry_policy = Some(RetryPolicy {
            limit,
            limit_str,
            interval,
            exit_codes,
            backoff,
            max_interval: None,
        });
    }

    if let Some(repeat_raw) = raw.get("repeat_policy") {
        let field = format!("{field_prefix}.repeat_policy");
        let mode = match repeat_raw.get("mode").and_then(|v| v.as_str()) {
            Some("until") => RepeatMode::Until,
            _ => RepeatMode::While,
        };
        let condition = repeat_raw.get("condition").and_then(|v| v.as_str()).map(String::from);
        let interval = match repeat_raw.get("interval").and_then(|v| v.as_str()) {
            Some(s) => parse_duration(&format!("{field}.interval"), s).unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        };
        let limit = repeat_raw.get("limit").and_then(|v| v.as_i64());
        let backoff = repeat_raw.get("backoff").and_then(|v| v.as_f64()).unwrap_or(1.0);
        step.repeat_policy = Some(RepeatPolicy {
            mode,
            condition,
            exit_codes: Vec::new(),
            interval,
            limit,
            backoff,
            max_interval: None,
        });
    }
}

fn compile_continue_on_and_preconditions(
    field_prefix: &str,
    raw: &Value,
    errors: &mut ErrorAggregator,
    step: &mut Step,
) {
    if let Some(c) = raw.get("continue_on") {
        step.continue_on = ContinueOn {
            failure: c.get("failure").and_then(|v| v.as_bool()).unwrap_or(false),
            skipped: c.get("skipped").and_then(|v| v.as_bool()).unwrap_or(false),
            exit_codes: c
                .get("exit_codes")
                .and_then(|v| v.as_sequence())
                .map(|s| s.iter().filter_map(|n| n.as_i64().map(|n| n as i32)).collect())
                .unwrap_or_default(),
            output_patterns: c
                .get("output")
                .map(PolyValue::decode)
                .and_then(|p| p.as_string_list("continue_on.output").ok())
                .unwrap_or_default(),
        };
    }

    if let Some(Value::Sequence(items)) = raw.get("preconditions") {
        for (i, item) in items.iter().enumerate() {
            let field = format!("{field_prefix}.preconditions[{i}]");
            match (item.get("condition").and_then(|v| v.as_str()), item.get("expected").and_then(|v| v.as_str())) {
                (Some(condition), expected) => step.preconditions.push(Precondition {
                    condition: condition.to_string(),
                    expected: expected.unwrap_or("0").to_string(),
                }),
                (None, _) => errors.push(ValidationError::new(field, ErrorCode::MissingRequired, "precondition requires 'condition'")),
            }
        }
    }
}

fn compile_env_and_output(field_prefix: &str, raw: &Value, errors: &mut ErrorAggregator, step: &mut Step) {
    if let Some(env_raw) = raw.get("env") {
        match PolyValue::decode(env_raw).as_ordered_pairs(&format!("{field_prefix}.env")) {
            Ok(pairs) => step.env = pairs,
            Err(e) => errors.push(e),
        }
    }
    if let Some(output_raw) = raw.get("output") {
        let name = output_raw
            .as_str()
            .map(String::from)
            .or_else(|| output_raw.get("name").and_then(|v| v.as_str()).map(String::from))
            .unwrap_or_default();
        step.output = Some(OutputDescriptor {
            name,
            key: output_raw.get("key").and_then(|v| v.as_str()).map(String::from),
            omit: output_raw.get("omit").and_then(|v| v.as_bool()).unwrap_or(false),
        });
    }
    step.stdout = raw.get("stdout").and_then(|v| v.as_str()).map(String::from);
    step.stderr = raw.get("stderr").and_then(|v| v.as_str()).map(String::from);
    if let (Some(out), Some(err)) = (&step.stdout, &step.stderr) {
        if out == err {
            errors.push(ValidationError::new(
                format!("{field_prefix}.stderr"),
                ErrorCode::Conflict,
                "stdout and stderr must not redirect to the same target",
            ));
        }
    }
}

fn compile_misc(field_prefix: &str, raw: &Value, errors: &mut ErrorAggregator, step: &mut Step) {
    step.shell = raw.get("shell").and_then(|v| v.as_str()).map(String::from);
    if let Some(args_raw) = raw.get("shell_args") {
        step.shell_args = PolyValue::decode(args_raw)
            .as_string_list(&format!("{field_prefix}.shell_args"))
            .unwrap_or_default();
    }
    if let Some(signal_raw) = raw.get("signal_on_stop").and_then(|v| v.as_str()) {
        match build_signal(&format!("{field_prefix}.signal_on_stop"), signal_raw) {
            Ok(signal) => step.signal_on_stop = Some(signal),
            Err(e) => errors.push(e),
        }
    }
    if let Some(selector_raw) = raw.get("worker_selector") {
        match dagc_build::build_worker_selector(
            &format!("{field_prefix}.worker_selector"),
            &PolyValue::decode(selector_raw),
        ) {
            Ok((selector, _)) => step.worker_selector = selector,
            Err(e) => errors.push(e),
        }
    }
    if let Some(timeout_raw) = raw.get("timeout") {
        let field = format!("{field_prefix}.timeout");
        match timeout_raw.as_str() {
            Some(s) => match parse_duration(&field, s) {
                Ok(d) => step.timeout = Some(d),
                Err(e) => errors.push(e),
            },
            None => {
                if let Some(n) = timeout_raw.as_u64() {
                    step.timeout = Some(Duration::from_secs(n));
                }
            }
        }
    }
    if let Some(count_raw) = raw.get("log_output").and_then(|v| v.as_str()) {
        step.log_output = count_raw.to_string();
    }
    step.mail_on_error = raw.get("mail_on_error").and_then(|v| v.as_bool()).unwrap_or(false);
}

fn gate_against_capabilities(field_prefix: &str, step: &Step, errors: &mut ErrorAggregator) {
    let mut requested = Vec::new();
    if step.retry_policy.is_some() {
        requested.push((Capability::Retry, "retry_policy"));
    }
    if step.repeat_policy.is_some() {
        requested.push((Capability::Repeat, "repeat_policy"));
    }
    if step.container.is_some() {
        requested.push((Capability::Container, "container"));
    }
    if step.stdout.is_some() || step.stderr.is_some() {
        requested.push((Capability::OutputRedirect, "stdout"));
    }
    if step.worker_selector != WorkerSelector::None {
        requested.push((Capability::WorkerSelector, "worker_selector"));
    }
    if step.timeout.is_some() {
        requested.push((Capability::Timeout, "timeout"));
    }
    if step.output.is_some() {
        requested.push((Capability::Output, "output"));
    }
    if !step.preconditions.is_empty() {
        requested.push((Capability::Preconditions, "preconditions"));
    }
    if !step.env.is_empty() {
        requested.push((Capability::Env, "env"));
    }
    if step.shell.is_some() {
        requested.push((Capability::Shell, "shell"));
    }
    if step.parallel.is_some() {
        requested.push((Capability::Parallel, "parallel"));
    }
    if matches!(&step.run, Some(RunSpec::Commands(cmds)) if cmds.len() > 1) {
        requested.push((Capability::MultipleCommands, "command"));
    }
    let result = gate(&step.executor.executor_type, &requested);
    errors.extend(result.into_errors(field_prefix));
}

fn serde_yaml_to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
