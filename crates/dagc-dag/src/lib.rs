// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! DAG compiler orchestrator (component D).
//!
//! [`build`] is the single entry point every caller (the CLI, tests, future
//! embedders) goes through. It runs the metadata tier, then — unless
//! [`dagc_core::context::Flag::OnlyMetadata`] is set — the full tier: step
//! compilation, chain/router rewriting, defaults merge, and cross-cutting
//! DAG validation (duplicate names, dangling references, cycles). Every
//! problem found along the way is collected, never raised eagerly; the
//! [`BuildContext`]'s `allow_build_errors` flag decides whether that
//! collection becomes a hard `Err` or rides along in
//! [`dagc_core::Workflow::build_errors`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_yaml::Value;
use tracing::debug_span;

use dagc_core::aggregate::{check_unknown_keys, ErrorAggregator};
use dagc_core::chain::{apply_chain_dependencies, lower_router, validate_chain_mode};
use dagc_core::context::BuildContext;
use dagc_core::decode::PolyValue;
use dagc_core::defaults::{apply_base_overlay, merge_step_defaults, StepDefaults, StepPresence};
use dagc_core::duration::parse_duration;
use dagc_core::{BuildWarning, Catchup, ErrorCode, Schedule, ValidationError, Workflow};

/// Compile a surface YAML document into a [`Workflow`].
///
/// # Errors
/// Returns the accumulated [`dagc_core::aggregate::CompositeError`] when any
/// [`ValidationError`] was recorded and
/// `ctx.options.allow_build_errors()` is `false`. When that flag is set, the
/// same errors are returned inside `Ok(Workflow { build_errors, .. })`
/// instead.
pub fn build(
    doc: &Value,
    ctx: &BuildContext,
    schema: Option<&dyn dagc_params::SchemaSource>,
) -> Result<Workflow, dagc_core::aggregate::CompositeError> {
    let _span = debug_span!("build").entered();
    let mut errors = ErrorAggregator::new();

    if let Err(decode_err) = dagc_core::decode::decode_document(doc) {
        errors.push(ValidationError::new("$", ErrorCode::InvalidShape, decode_err.to_string()));
        return errors.into_result().map(|()| Workflow::default());
    }

    let effective_doc = match &ctx.base_overlay {
        Some(overlay) => apply_base_overlay(doc, overlay),
        None => doc.clone(),
    };

    let mut workflow = Workflow::default();
    compile_metadata(&effective_doc, ctx, &mut errors, &mut workflow);

    if ctx.options.no_eval() {
        return finish(workflow, errors, ctx);
    }

    compile_schedules(&effective_doc, &mut errors, &mut workflow);
    compile_params(&effective_doc, &mut errors, &mut workflow, schema, ctx);

    if ctx.options.only_metadata() {
        return finish(workflow, errors, ctx);
    }

    compile_steps_and_handlers(&effective_doc, &ctx.base_dir, &mut errors, &mut workflow);
    validate_chain_mode(workflow.workflow_type, &workflow.steps, &mut errors);
    apply_chain_dependencies(workflow.workflow_type, &mut workflow.steps);
    lower_router(&mut workflow.steps, &mut errors);
    apply_dag_level_defaults(&mut workflow);
    validate_cross_cutting(&mut errors, &workflow);

    finish(workflow, errors, ctx)
}

fn finish(
    mut workflow: Workflow,
    errors: ErrorAggregator,
    ctx: &BuildContext,
) -> Result<Workflow, dagc_core::aggregate::CompositeError> {
    if errors.is_empty() {
        return Ok(workflow);
    }
    if ctx.options.allow_build_errors() {
        workflow.build_errors = errors.into_vec();
        Ok(workflow)
    } else {
        errors.into_result().map(|()| workflow)
    }
}

/// Every key a workflow document recognizes at its top level. Anything else
/// is `UnknownKey`, with a legacy-spelling hint attached automatically when
/// one is known. Includes fields not yet transformed by this compiler
/// (`s3`, `redis`, `secrets`, `otel`, `mail`, `run_config`, `dotenv`, `smtp`,
/// `preconditions`, `telemetry`) since they are still valid surface per the
/// data model — only genuinely unrecognized keys should be flagged.
const KNOWN_WORKFLOW_KEYS: &[&str] = &[
    "name", "type", "group", "description", "working_dir", "steps", "schedule", "stop_schedule",
    "restart_schedule", "catchup", "catchup_window", "params", "tags", "env", "timeout", "queue",
    "max_active_runs", "max_active_steps", "worker_selector", "log_output", "container", "ssh",
    "s3", "redis", "secrets", "otel", "mail", "run_config", "dotenv", "smtp", "preconditions",
    "telemetry", "init", "exit", "on_success", "on_failure", "on_cancel", "on_wait",
];

fn compile_metadata(doc: &Value, ctx: &BuildContext, errors: &mut ErrorAggregator, workflow: &mut Workflow) {
    let base_dir = ctx.base_dir.as_path();
    check_unknown_keys("$", doc, KNOWN_WORKFLOW_KEYS, errors);
    workflow.name = doc.get("name").and_then(|v| v.as_str()).map(|s| {
        dagc_build::build_name("name", s).unwrap_or_else(|e| {
            errors.push(e);
            s.to_string()
        })
    });
    if let Some(name) = &ctx.name_override {
        workflow.name = Some(name.clone());
    }
    workflow.group = doc.get("group").and_then(|v| v.as_str()).map(String::from);
    workflow.description = doc.get("description").and_then(|v| v.as_str()).map(String::from);
    workflow.working_dir = doc
        .get("working_dir")
        .and_then(|v| v.as_str())
        .and_then(|s| dagc_build::build_working_dir(base_dir, s))
        .or_else(|| ctx.default_working_dir.clone());

    workflow.workflow_type = match doc.get("type").and_then(|v| v.as_str()) {
        Some(raw) => dagc_build::build_workflow_type("type", raw).unwrap_or_else(|e| {
            errors.push(e);
            Default::default()
        }),
        None => Default::default(),
    };

    if let Some(tags_raw) = doc.get("tags") {
        match dagc_build::build_tags("tags", &PolyValue::decode(tags_raw)) {
            Ok(tags) => workflow.tags = tags,
            Err(e) => errors.push(e),
        }
    }

    if let Some(env_raw) = doc.get("env") {
        match PolyValue::decode(env_raw).as_ordered_pairs("env") {
            Ok(pairs) => workflow.env = pairs,
            Err(e) => errors.push(e),
        }
    }
    if !ctx.build_env.is_empty() {
        let mut env = ctx.build_env.clone();
        env.extend(workflow.env.drain(..));
        workflow.env = env;
    }

    if let Some(timeout_raw) = doc.get("timeout").and_then(|v| v.as_str()) {
        match parse_duration("timeout", timeout_raw) {
            Ok(d) => workflow.timeout = Some(d),
            Err(e) => errors.push(e),
        }
    } else if let Some(n) = doc.get("timeout").and_then(|v| v.as_u64()) {
        workflow.timeout = Some(Duration::from_secs(n));
    }

    workflow.queue = doc.get("queue").and_then(|v| v.as_str()).map(String::from);

    let max_active_runs_raw = doc.get("max_active_runs").map(PolyValue::decode);
    match dagc_build::build_max_active_runs("max_active_runs", max_active_runs_raw.as_ref()) {
        Ok((n, should_warn)) => {
            workflow.max_active_runs = n;
            if should_warn && workflow.queue.is_none() {
                workflow.build_warnings.push(BuildWarning {
                    field: "max_active_runs".to_string(),
                    message: format!(
                        "max_active_runs={n} with no queue configured may over-schedule; consider setting 'queue'"
                    ),
                });
            }
        }
        Err(e) => errors.push(e),
    }

    if let Some(raw) = doc.get("max_active_steps") {
        match dagc_build::build_bounded_count("max_active_steps", &PolyValue::decode(raw)) {
            Ok(n) => workflow.max_active_steps = n,
            Err(e) => errors.push(e),
        }
    }

    if let Some(selector_raw) = doc.get("worker_selector") {
        match dagc_build::build_worker_selector("worker_selector", &PolyValue::decode(selector_raw)) {
            Ok((selector, force_local)) => {
                workflow.worker_selector = selector;
                workflow.force_local = force_local;
            }
            Err(e) => errors.push(e),
        }
    }

    if let Some(s) = doc.get("log_output").and_then(|v| v.as_str()) {
        workflow.log_output = s.to_string();
    }
}

fn compile_one_schedule_kind(
    doc: &Value,
    doc_key: &str,
    errors: &mut ErrorAggregator,
) -> Vec<Schedule> {
    let Some(raw) = doc.get(doc_key) else {
        return Vec::new();
    };
    let expressions = PolyValue::decode(raw).as_string_list(doc_key).unwrap_or_default();
    let catchup = match doc.get("catchup").and_then(|v| v.as_str()) {
        Some("all") => Catchup::All,
        Some("latest") => Catchup::Latest,
        _ => Catchup::Off,
    };
    let catchup_window = doc
        .get("catchup_window")
        .and_then(|v| v.as_str())
        .and_then(|s| parse_duration("catchup_window", s).ok());

    let mut schedules = Vec::new();
    for (i, expr) in expressions.iter().enumerate() {
        match dagc_schedule::build_schedule(&format!("{doc_key}[{i}]"), expr, catchup, catchup_window) {
            Ok(schedule) => schedules.push(schedule),
            Err(e) => errors.push(e),
        }
    }
    schedules
}

fn compile_schedules(doc: &Value, errors: &mut ErrorAggregator, workflow: &mut Workflow) {
    workflow.schedules = compile_one_schedule_kind(doc, "schedule", errors);
    workflow.stop_schedules = compile_one_schedule_kind(doc, "stop_schedule", errors);
    workflow.restart_schedules = compile_one_schedule_kind(doc, "restart_schedule", errors);
}

fn compile_params(
    doc: &Value,
    errors: &mut ErrorAggregator,
    workflow: &mut Workflow,
    schema: Option<&dyn dagc_params::SchemaSource>,
    ctx: &BuildContext,
) {
    let Some(params_raw) = doc.get("params") else {
        workflow.params_json = serde_json::Value::Object(serde_json::Map::new());
        apply_build_option_overrides(ctx, errors, workflow);
        validate_params_schema(&workflow.params_json, errors, schema, ctx);
        return;
    };

    // A `params:` string that itself parses as JSON is passed through
    // verbatim rather than re-tokenized: the caller opted into structured
    // JSON, and re-deriving it from a Param list would lose any nested
    // array/object values the schema might expect. `Parameters`/
    // `ParametersList` overrides still apply, as appended/replaced object keys.
    if let Value::String(s) = params_raw {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(s.trim()) {
            workflow.params_json = json;
            apply_build_option_overrides(ctx, errors, workflow);
            validate_params_schema(&workflow.params_json, errors, schema, ctx);
            return;
        }
    }

    let params = match params_raw {
        Value::String(s) => dagc_params::parse_params_string("params", s).unwrap_or_else(|e| {
            errors.push(e);
            Vec::new()
        }),
        Value::Mapping(_) => {
            let schema_ref = params_raw
                .get("schema")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let mut params: Vec<dagc_core::Param> = PolyValue::decode(params_raw)
                .as_ordered_pairs("params")
                .map(|pairs| {
                    pairs
                        .into_iter()
                        .filter(|(name, _)| name != "schema")
                        .map(|(name, value)| dagc_core::Param {
                            name,
                            value,
                            positional: false,
                        })
                        .collect()
                })
                .unwrap_or_else(|e| {
                    errors.push(e);
                    Vec::new()
                });
            if let Some(schema_ref) = schema_ref {
                match dagc_params::FileSchemaSource::new(ctx.base_dir.join(&schema_ref)).load() {
                    Ok(schema_doc) => {
                        let defaults = dagc_params::materialize_schema_defaults(&schema_doc, &params);
                        params.splice(0..0, defaults);
                    }
                    Err(e) => errors.push(e),
                }
            }
            params
        }
        _ => Vec::new(),
    };
    workflow.params = params;
    workflow.params_json = dagc_params::params_to_json(&workflow.params);
    apply_build_option_overrides(ctx, errors, workflow);
    validate_params_schema(&workflow.params_json, errors, schema, ctx);
}

/// Apply the `Parameters` then `ParametersList` build-option overrides (in
/// that order) over a workflow's already-resolved parameters.
///
/// Mirrors [`dagc_params::apply_overrides`]'s semantics for the `Param` list
/// form; for a raw JSON pass-through `params_json`, the same pairs are
/// merged as object keys instead so a caller never has to know which
/// surface form the document used.
fn apply_build_option_overrides(ctx: &BuildContext, errors: &mut ErrorAggregator, workflow: &mut Workflow) {
    let mut overrides = Vec::new();
    if let Some(raw) = &ctx.parameters {
        match dagc_params::parse_params_string("parameters", raw) {
            Ok(o) => overrides.extend(o),
            Err(e) => errors.push(e),
        }
    }
    for raw in &ctx.parameters_list {
        match dagc_params::parse_params_string("parameters_list", raw) {
            Ok(o) => overrides.extend(o),
            Err(e) => errors.push(e),
        }
    }
    if overrides.is_empty() {
        return;
    }
    if workflow.params.is_empty() {
        if let serde_json::Value::Object(map) = &mut workflow.params_json {
            for param in overrides {
                map.insert(param.name, dagc_params::coerce_json_scalar(&param.value));
            }
            return;
        }
    }
    workflow.params = dagc_params::apply_overrides(std::mem::take(&mut workflow.params), overrides);
    workflow.params_json = dagc_params::params_to_json(&workflow.params);
}

fn validate_params_schema(
    params_json: &serde_json::Value,
    errors: &mut ErrorAggregator,
    schema: Option<&dyn dagc_params::SchemaSource>,
    ctx: &BuildContext,
) {
    if ctx.options.skip_schema_validation() {
        return;
    }
    let Some(source) = schema else {
        return;
    };
    match source.load() {
        Ok(schema_doc) => {
            if let Err(e) = dagc_params::validate_against_schema(params_json, &schema_doc) {
                errors.push(e);
            }
        }
        Err(e) => errors.push(e),
    }
}

fn compile_steps_and_handlers(
    doc: &Value,
    base_dir: &std::path::Path,
    errors: &mut ErrorAggregator,
    workflow: &mut Workflow,
) {
    let dag_hints = dagc_step::DagExecutorHints {
        has_container: doc.get("container").is_some(),
        has_ssh: doc.get("ssh").is_some(),
    };

    if let Some(Value::Sequence(steps_raw)) = doc.get("steps") {
        for (i, raw) in steps_raw.iter().enumerate() {
            workflow.steps.push(dagc_step::compile_step_with_hints(
                &format!("steps[{i}]"),
                raw,
                base_dir,
                errors,
                dag_hints,
            ));
        }
    }

    for (slot, field) in [
        ("init", "init"),
        ("exit", "exit"),
        ("success", "on_success"),
        ("failure", "on_failure"),
        ("cancel", "on_cancel"),
        ("wait", "on_wait"),
    ] {
        if let Some(raw) = doc.get(field) {
            let step = dagc_step::compile_step_with_hints(slot, raw, base_dir, errors, dag_hints);
            match slot {
                "init" => workflow.handlers.init = Some(step),
                "exit" => workflow.handlers.exit = Some(step),
                "success" => workflow.handlers.success = Some(step),
                "failure" => workflow.handlers.failure = Some(step),
                "cancel" => workflow.handlers.cancel = Some(step),
                "wait" => workflow.handlers.wait = Some(step),
                _ => unreachable!(),
            }
        }
    }
}

fn apply_dag_level_defaults(workflow: &mut Workflow) {
    let defaults = StepDefaults {
        env: workflow.env.clone(),
        worker_selector: Some(workflow.worker_selector.clone()),
        timeout: workflow.timeout,
        log_output: workflow.log_output.clone(),
        working_dir: workflow.working_dir.clone(),
        ..Default::default()
    };
    for step in &mut workflow.steps {
        // Declared DAG-level env/worker_selector/timeout always act as
        // defaults; the step compiler never reads those keys itself, so
        // every field here is by definition absent from the step.
        let presence = StepPresence::default();
        merge_step_defaults(step, &defaults, &presence);
    }
}

fn validate_cross_cutting(errors: &mut ErrorAggregator, workflow: &Workflow) {
    let mut seen = HashMap::new();
    for (i, step) in workflow.steps.iter().enumerate() {
        if let Some(prev) = seen.insert(step.name.clone(), i) {
            errors.push(ValidationError::new(
                format!("steps[{i}].name"),
                ErrorCode::DuplicateName,
                format!("step name '{}' first used at steps[{prev}]", step.name),
            ));
        }
    }

    let names: HashSet<&str> = workflow.steps.iter().map(|s| s.name.as_str()).collect();
    for (i, step) in workflow.steps.iter().enumerate() {
        for dep in &step.depends {
            if !names.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    format!("steps[{i}].depends"),
                    ErrorCode::DanglingReference,
                    format!("'{dep}' does not name a step in this workflow"),
                ));
            }
        }
        if workflow.force_local && step.worker_selector != dagc_core::WorkerSelector::None {
            errors.push(ValidationError::new(
                format!("steps[{i}].worker_selector"),
                ErrorCode::Conflict,
                "step sets a worker selector but the workflow forces local execution",
            ));
        }
    }

    let has_hitl_step = workflow
        .steps
        .iter()
        .any(|s| s.executor.executor_type == "hitl");
    if has_hitl_step && workflow.worker_selector != dagc_core::WorkerSelector::None {
        errors.push(ValidationError::new(
            "worker_selector",
            ErrorCode::Conflict,
            "a workflow with a human-in-the-loop step cannot set a worker_selector",
        ));
    }

    if let Some(cycle) = detect_cycle(workflow) {
        errors.push(ValidationError::new(
            "steps",
            ErrorCode::CycleDetected,
            format!("dependency cycle: {}", cycle.join(" -> ")),
        ));
    }
}

fn detect_cycle(workflow: &Workflow) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }
    let by_name: HashMap<&str, &dagc_core::Step> =
        workflow.steps.iter().map(|s| (s.name.as_str(), s)).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<String> = Vec::new();

    fn visit<'a>(
        name: &'a str,
        by_name: &HashMap<&'a str, &'a dagc_core::Step>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                stack.push(name.to_string());
                return Some(stack.clone());
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        stack.push(name.to_string());
        if let Some(step) = by_name.get(name) {
            for dep in &step.depends {
                if let Some(cycle) = visit(dep.as_str(), by_name, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        None
    }

    for step in &workflow.steps {
        if let Some(cycle) = visit(step.name.as_str(), &by_name, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagc_core::context::BuildContext;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn minimal_chain_workflow_builds() {
        let doc = yaml("name: hello\nsteps:\n  - name: a\n    command: echo a\n  - name: b\n    command: echo b\n");
        let ctx = BuildContext::new(".");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.steps[1].depends, vec!["a"]);
    }

    #[test]
    fn legacy_dir_key_is_rejected_with_hint() {
        let doc = yaml("name: hello\ndir: /tmp\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        let hit = err.errors().iter().find(|e| e.code == ErrorCode::UnknownKey).unwrap();
        assert!(hit.wrapped.as_deref().unwrap_or_default().contains("working_dir"));
    }

    #[test]
    fn unrecognized_top_level_key_is_rejected() {
        let doc = yaml("name: hello\nbogus_field: 1\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::UnknownKey));
    }

    #[test]
    fn empty_type_string_defaults_to_chain_without_error() {
        let doc = yaml("name: hello\ntype: \"\"\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.workflow_type, dagc_core::WorkflowType::Chain);
    }

    #[test]
    fn duplicate_step_names_rejected() {
        let doc = yaml("name: dup\nsteps:\n  - name: a\n    command: echo a\n  - name: a\n    command: echo b\n");
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::DuplicateName));
    }

    #[test]
    fn dangling_dependency_rejected() {
        let doc = yaml("name: dangling\ntype: graph\nsteps:\n  - name: a\n    command: echo a\n    depends: [missing]\n");
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::DanglingReference));
    }

    #[test]
    fn cycle_is_detected_in_graph_mode() {
        let doc = yaml(
            "name: cyclic\ntype: graph\nsteps:\n  - name: a\n    command: echo a\n    depends: [b]\n  - name: b\n    command: echo b\n    depends: [a]\n",
        );
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::CycleDetected));
    }

    #[test]
    fn allow_build_errors_returns_ok_with_errors_attached() {
        let doc = yaml("name: dup\nsteps:\n  - name: a\n    command: echo a\n  - name: a\n    command: echo b\n");
        let ctx = BuildContext::new(".")
            .with_options(dagc_core::context::BuildOptions::new().with(dagc_core::context::Flag::AllowBuildErrors));
        let workflow = build(&doc, &ctx, None).unwrap();
        assert!(!workflow.build_errors.is_empty());
    }

    #[test]
    fn only_metadata_skips_step_compilation() {
        let doc = yaml("name: meta-only\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".")
            .with_options(dagc_core::context::BuildOptions::new().with(dagc_core::context::Flag::OnlyMetadata));
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.name.as_deref(), Some("meta-only"));
        assert!(workflow.steps.is_empty());
    }

    #[test]
    fn non_mapping_document_fails_fast() {
        let doc = yaml("- a\n- b\n");
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].code, ErrorCode::InvalidShape);
    }

    #[test]
    fn hitl_step_conflicts_with_workflow_worker_selector() {
        let doc = yaml(
            "name: approval\nworker_selector:\n  zone: us-east\nsteps:\n  - name: a\n    executor: hitl\n",
        );
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::Conflict));
    }

    #[test]
    fn max_active_runs_above_one_without_queue_warns() {
        let doc = yaml("name: busy\nmax_active_runs: 5\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert!(workflow
            .build_warnings
            .iter()
            .any(|w| w.field == "max_active_runs"));
    }

    #[test]
    fn max_active_runs_zero_defaults_to_one() {
        let doc = yaml("name: default-runs\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.max_active_runs, 1);
    }

    #[test]
    fn relative_working_dir_joins_against_base_dir() {
        let doc = yaml("name: wd\nworking_dir: out\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new("/home/flows");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.working_dir.as_deref(), Some("/home/flows/out"));
        assert_eq!(workflow.steps[0].working_dir.as_deref(), Some("/home/flows/out"));
    }

    #[test]
    fn json_params_string_passes_through_verbatim() {
        let doc = yaml(
            "name: json-params\nparams: '{\"a\": 1, \"b\": [1, 2]}'\nsteps:\n  - name: s\n    command: echo hi\n",
        );
        let ctx = BuildContext::new(".");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.params_json, serde_json::json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn parameters_override_replaces_declared_value() {
        let doc = yaml("name: with-params\nparams: FOO=bar\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".").with_parameters("FOO=baz");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.params_json.get("FOO"), Some(&serde_json::json!("baz")));
    }

    #[test]
    fn parameters_list_overrides_apply_in_order_after_parameters() {
        let doc = yaml("name: with-params\nparams: FOO=bar BAZ=qux\nsteps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".")
            .with_parameters("FOO=one")
            .with_parameters_list(vec!["FOO=two".into(), "NEW=3".into()]);
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.params_json.get("FOO"), Some(&serde_json::json!("two")));
        assert_eq!(workflow.params_json.get("BAZ"), Some(&serde_json::json!("qux")));
        assert_eq!(workflow.params_json.get("NEW"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn parameters_override_merges_into_json_passthrough_params() {
        let doc = yaml("name: json-params\nparams: '{\"a\": 1}'\nsteps:\n  - name: s\n    command: echo hi\n");
        let ctx = BuildContext::new(".").with_parameters("a=2 b=3");
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.params_json, serde_json::json!({"a": 2, "b": 3}));
    }

    #[test]
    fn chain_workflow_with_explicit_depends_is_rejected() {
        let doc = yaml(
            "name: s5\ntype: chain\nsteps:\n  - name: s1\n    command: echo a\n  - name: s2\n    command: echo b\n    depends: [s1]\n",
        );
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::Conflict));
    }

    #[test]
    fn build_context_overrides_name_working_dir_and_env() {
        let doc = yaml("steps:\n  - name: a\n    command: echo a\n");
        let ctx = BuildContext::new(".")
            .with_name_override("overridden")
            .with_default_working_dir("/var/run/flows")
            .with_build_env(vec![("SHARED".into(), "0".into())]);
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(workflow.name.as_deref(), Some("overridden"));
        assert_eq!(workflow.working_dir.as_deref(), Some("/var/run/flows"));
        assert_eq!(workflow.env[0], ("SHARED".to_string(), "0".to_string()));
    }

    #[test]
    fn params_schema_default_materializes_as_pair() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("params.schema.json");
        std::fs::write(
            &schema_path,
            r#"{"properties": {"region": {"type": "string", "default": "us-east"}}}"#,
        )
        .unwrap();
        let doc = yaml(&format!(
            "name: with-schema\nparams:\n  schema: {}\nsteps:\n  - name: a\n    command: echo a\n",
            schema_path.file_name().unwrap().to_str().unwrap()
        ));
        let ctx = BuildContext::new(dir.path());
        let workflow = build(&doc, &ctx, None).unwrap();
        assert_eq!(
            workflow.params_json.get("region"),
            Some(&serde_json::json!("us-east"))
        );
    }

    #[test]
    fn force_local_conflicts_with_step_worker_selector() {
        let doc = yaml(
            "name: conflict\nworker_selector: local\nsteps:\n  - name: a\n    command: echo a\n    worker_selector:\n      zone: us-east\n",
        );
        let ctx = BuildContext::new(".");
        let err = build(&doc, &ctx, None).unwrap_err();
        assert!(err.errors().iter().any(|e| e.code == ErrorCode::Conflict));
    }
}
