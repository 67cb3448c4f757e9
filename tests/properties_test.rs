// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-workspace integration tests pinning the compiler's testable
//! properties end to end, driving [`dagc_dag::build`] the way the CLI does.

use std::time::Duration;

use dagc_core::context::BuildContext;
use dagc_core::ErrorCode;

fn yaml(s: &str) -> serde_yaml::Value {
    serde_yaml::from_str(s).unwrap()
}

const FULL_DOC: &str = "\
name: release-pipeline
type: chain
working_dir: \"$WORK_DIR\"
tags: \"env=Prod,Team\"
params: \"FOO=bar COUNT=1\"
steps:
  - name: build
    command: make build
  - name: test
    command: make test
  - name: deploy
    command: make deploy
";

// Property 1: compiling the same document twice yields byte-identical
// output (modulo the timestamps the compiler never writes in the first
// place — there are none).
#[test]
fn property_1_compiling_twice_is_idempotent() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".");
    let first = dagc_dag::build(&doc, &ctx, None).unwrap();
    let second = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
}

// Property 2: tag round-trip lowercases keys/values and defaults a bare
// entry's value to the empty string.
#[test]
fn property_2_tag_round_trip() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert_eq!(
        workflow.tags,
        vec![
            ("env".to_string(), "prod".to_string()),
            ("team".to_string(), String::new()),
        ]
    );
}

// Property 3: chain-mode contract — no explicit depends, and every
// non-first step depends on exactly its immediate predecessor.
#[test]
fn property_3_chain_mode_contract() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert!(workflow.steps[0].depends.is_empty());
    assert_eq!(workflow.steps[1].depends, vec!["build".to_string()]);
    assert_eq!(workflow.steps[2].depends, vec!["test".to_string()]);
}

// Property 4: router lowering — each route target depends on the router
// and carries a precondition on the router's value, and belongs to no
// other route.
#[test]
fn property_4_router_lowering_adds_dependency_and_precondition() {
    let doc = yaml(
        "name: routed\nsteps:\n  - name: r\n    router:\n      value: \"{{ steps.r.output }}\"\n      routes:\n        - pattern: a\n          targets: [t1]\n        - pattern: b\n          targets: [t2]\n  - name: t1\n    command: echo 1\n  - name: t2\n    command: echo 2\n",
    );
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    let t1 = workflow.steps.iter().find(|s| s.name == "t1").unwrap();
    assert!(t1.depends.contains(&"r".to_string()));
    assert_eq!(t1.preconditions.len(), 1);
    let t2 = workflow.steps.iter().find(|s| s.name == "t2").unwrap();
    assert!(t2.depends.contains(&"r".to_string()));
}

// Property 5: executor capability — a populated field the resolved
// executor doesn't support is always rejected.
#[test]
fn property_5_executor_capability_rejects_unsupported_fields() {
    let doc = yaml("name: notify\nsteps:\n  - name: a\n    executor: mail\n    container:\n      image: busybox\n");
    let ctx = BuildContext::new(".");
    let err = dagc_dag::build(&doc, &ctx, None).unwrap_err();
    assert!(err.errors().iter().any(|e| e.code == ErrorCode::UnsupportedByExecutor));
}

// Property 6: stdout/stderr distinctness.
#[test]
fn property_6_stdout_and_stderr_must_differ() {
    let doc = yaml("name: dup\nsteps:\n  - name: a\n    command: echo hi\n    stdout: out.log\n    stderr: out.log\n");
    let ctx = BuildContext::new(".");
    let err = dagc_dag::build(&doc, &ctx, None).unwrap_err();
    assert!(err.errors().iter().any(|e| e.code == ErrorCode::Conflict));
}

// Property 7: parameter override — Parameters merges over declared
// defaults, last write wins, untouched keys survive.
#[test]
fn property_7_parameter_override_merges_over_defaults() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".").with_parameters("FOO=baz EXTRA=qux");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert_eq!(
        workflow.params_json,
        serde_json::json!({"FOO": "baz", "COUNT": "1", "EXTRA": "qux"})
    );
}

// Property 8: when params is valid JSON, ParamsJSON equals the input
// verbatim (modulo the Parameters/ParametersList overrides also applying).
#[test]
fn property_8_json_params_pass_through_verbatim() {
    let doc = yaml("name: json-params\nparams: '{\"a\": 1, \"b\": [1, 2, 3]}'\nsteps:\n  - name: s\n    command: echo hi\n");
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert_eq!(workflow.params_json, serde_json::json!({"a": 1, "b": [1, 2, 3]}));
}

#[test]
fn s4_working_dir_round_trips_through_the_full_pipeline() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert_eq!(workflow.working_dir.as_deref(), Some("$WORK_DIR"));
}

#[test]
fn snapshot_full_pipeline_materialized_workflow() {
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    insta::assert_json_snapshot!("full_pipeline_materialized_workflow", workflow);
}

#[test]
fn metadata_only_build_skips_step_compilation() {
    use dagc_core::context::{BuildOptions, Flag};
    let doc = yaml(FULL_DOC);
    let ctx = BuildContext::new(".").with_options(BuildOptions::new().with(Flag::OnlyMetadata));
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    assert!(workflow.steps.is_empty());
    assert_eq!(workflow.name.as_deref(), Some("release-pipeline"));
}

#[test]
fn healthcheck_duration_fields_parse_through_the_full_pipeline() {
    let doc = yaml(
        "name: svc\nsteps:\n  - name: a\n    command: echo hi\n    container:\n      image: postgres\n      healthcheck:\n        test: [pg_isready]\n        interval: 10s\n        timeout: 2s\n        retries: 5\n",
    );
    let ctx = BuildContext::new(".");
    let workflow = dagc_dag::build(&doc, &ctx, None).unwrap();
    let hc = workflow.steps[0].container.as_ref().unwrap().healthcheck.as_ref().unwrap();
    assert_eq!(hc.interval, Duration::from_secs(10));
    assert_eq!(hc.timeout, Duration::from_secs(2));
}
