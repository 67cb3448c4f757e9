// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presence-aware defaults merge (component G).
//!
//! Two distinct merges live here:
//!
//! - [`merge_step_defaults`]: DAG-level step defaults (shell, timeout,
//!   retry/repeat policy, container, worker selector, log output) fill a
//!   step's field only when the surface document left that field absent —
//!   a step that explicitly sets `timeout: 0` keeps its zero, it is not
//!   overwritten by a DAG-level default, because presence is checked
//!   against the *raw* surface node, not against the compiled zero value.
//!   `env` and `preconditions` are additive: the DAG-level entries are
//!   prepended ahead of the step's own, regardless of presence, so a step
//!   can add to but never silently lose an ambient entry.
//! - [`apply_base_overlay`]: an optional shared surface document (the
//!   "base config") is merged under a workflow's own top-level document
//!   before metadata-tier transformers run, so a workflow can omit fields
//!   it inherits from the overlay entirely.

use serde_yaml::Value;

use crate::{ContinueOn, RepeatPolicy, RetryPolicy, WorkerSelector};

/// Keys whose list-shaped value is additive: the defaults engine prepends,
/// it never replaces.
const ADDITIVE_KEYS: &[&str] = &["env", "preconditions", "tags"];

/// DAG-level defaults a step inherits when its own surface node leaves the
/// corresponding field absent.
#[derive(Debug, Clone, Default)]
pub struct StepDefaults {
    /// Entries prepended ahead of the step's own `env`.
    pub env: Vec<(String, String)>,
    /// Entries prepended ahead of the step's own `preconditions`.
    pub preconditions: Vec<(String, String)>,
    /// Default worker selector, used when the step sets none.
    pub worker_selector: Option<WorkerSelector>,
    /// Default shell, used when the step sets none.
    pub shell: Option<String>,
    /// Default per-step timeout, used when the step sets none.
    pub timeout: Option<std::time::Duration>,
    /// Default retry policy, used when the step sets none.
    pub retry_policy: Option<RetryPolicy>,
    /// Default repeat policy, used when the step sets none.
    pub repeat_policy: Option<RepeatPolicy>,
    /// Default continue-on, merged field-by-field (each sub-field ORed in
    /// only if the step's own is at its zero value).
    pub continue_on: ContinueOn,
    /// Default log output target, used when the step's own is empty.
    pub log_output: String,
    /// Default working directory, used when the step sets none.
    pub working_dir: Option<String>,
}

/// Which of a step's defaultable fields were present in its raw surface node.
///
/// Built by the step compiler from the raw mapping before any field is
/// populated with its zero value, so `merge_step_defaults` can tell "absent"
/// from "present but zero".
#[derive(Debug, Clone, Default)]
pub struct StepPresence {
    /// `true` if the step's raw node had a `worker_selector` key.
    pub worker_selector: bool,
    /// `true` if the step's raw node had a `shell` key.
    pub shell: bool,
    /// `true` if the step's raw node had a `timeout` key.
    pub timeout: bool,
    /// `true` if the step's raw node had a `retry_policy` key.
    pub retry_policy: bool,
    /// `true` if the step's raw node had a `repeat_policy` key.
    pub repeat_policy: bool,
    /// `true` if the step's raw node had a `log_output` key.
    pub log_output: bool,
    /// `true` if the step's raw node had a `working_dir` key.
    pub working_dir: bool,
}

impl StepPresence {
    /// Inspect a step's raw mapping node and record which defaultable keys
    /// are present.
    #[must_use]
    pub fn from_raw(raw: &Value) -> Self {
        let has = |key: &str| raw.get(key).is_some();
        Self {
            worker_selector: has("worker_selector"),
            shell: has("shell"),
            timeout: has("timeout"),
            retry_policy: has("retry_policy"),
            repeat_policy: has("repeat_policy"),
            log_output: has("log_output"),
            working_dir: has("working_dir"),
        }
    }
}

/// Apply DAG-level step defaults onto a compiled [`crate::Step`], in place.
pub fn merge_step_defaults(step: &mut crate::Step, defaults: &StepDefaults, presence: &StepPresence) {
    let mut env = defaults.env.clone();
    env.extend(step.env.drain(..));
    step.env = env;

    let mut preconditions: Vec<crate::Precondition> = defaults
        .preconditions
        .iter()
        .map(|(condition, expected)| crate::Precondition {
            condition: condition.clone(),
            expected: expected.clone(),
        })
        .collect();
    preconditions.extend(step.preconditions.drain(..));
    step.preconditions = preconditions;

    if !presence.worker_selector {
        if let Some(ws) = &defaults.worker_selector {
            step.worker_selector = ws.clone();
        }
    }
    if !presence.shell {
        if step.shell.is_none() {
            step.shell = defaults.shell.clone();
        }
    }
    if !presence.timeout && step.timeout.is_none() {
        step.timeout = defaults.timeout;
    }
    if !presence.retry_policy && step.retry_policy.is_none() {
        step.retry_policy = defaults.retry_policy.clone();
    }
    if !presence.repeat_policy && step.repeat_policy.is_none() {
        step.repeat_policy = defaults.repeat_policy.clone();
    }
    if !presence.log_output && step.log_output.is_empty() {
        step.log_output.clone_from(&defaults.log_output);
    }
    if !presence.working_dir && step.working_dir.is_none() {
        step.working_dir = defaults.working_dir.clone();
    }

    step.continue_on.failure |= defaults.continue_on.failure;
    step.continue_on.skipped |= defaults.continue_on.skipped;
    if step.continue_on.exit_codes.is_empty() {
        step.continue_on
            .exit_codes
            .clone_from(&defaults.continue_on.exit_codes);
    }
    if step.continue_on.output_patterns.is_empty() {
        step.continue_on
            .output_patterns
            .clone_from(&defaults.continue_on.output_patterns);
    }
}

/// Merge an optional base-config overlay under a workflow's own raw surface
/// document.
///
/// Scalar and mapping top-level keys present in `own` always win; keys
/// absent from `own` are taken from `overlay`. Keys in [`ADDITIVE_KEYS`] are
/// concatenated instead, overlay entries first so a workflow's own entries
/// are free to shadow them later in the merge pipeline.
#[must_use]
pub fn apply_base_overlay(own: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(own_map), Value::Mapping(overlay_map)) = (own, overlay) else {
        return own.clone();
    };
    let mut merged = own_map.clone();
    for (key, overlay_value) in overlay_map {
        let Some(key_str) = key.as_str() else { continue };
        match merged.get(key) {
            None => {
                merged.insert(key.clone(), overlay_value.clone());
            }
            Some(own_value) if ADDITIVE_KEYS.contains(&key_str) => {
                if let (Value::Sequence(own_seq), Value::Sequence(overlay_seq)) =
                    (own_value, overlay_value)
                {
                    let mut combined = overlay_seq.clone();
                    combined.extend(own_seq.clone());
                    merged.insert(key.clone(), Value::Sequence(combined));
                }
            }
            Some(_) => {}
        }
    }
    Value::Mapping(merged)
}
