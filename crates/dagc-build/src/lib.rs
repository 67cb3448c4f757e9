// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! Leaf value builders (component B).
//!
//! Each `build_*` function here owns exactly one field's surface-to-typed
//! conversion: a [`dagc_core::decode::PolyValue`] (or, where the grammar is
//! simple enough, a raw `&str`) in, a typed value or a single
//! [`ValidationError`] out. The step and DAG compilers call these; they hold
//! no state of their own and never look at sibling fields.

use dagc_core::decode::PolyValue;
use dagc_core::{ErrorCode, ValidationError, WorkerSelector, WorkflowType};

/// Recognized POSIX signal names accepted by `signal_on_stop`.
const SIGNAL_NAMES: &[&str] = &[
    "SIGHUP", "SIGINT", "SIGQUIT", "SIGKILL", "SIGTERM", "SIGUSR1", "SIGUSR2", "SIGSTOP", "SIGCONT",
];

/// Build a workflow/step name: non-empty, and restricted to the identifier
/// charset (alphanumerics, `-`, `_`, `.`).
///
/// # Errors
/// `MissingRequired` if empty; `InvalidShape` if it contains a character
/// outside the identifier charset.
pub fn build_name(field: &str, raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::new(field, ErrorCode::MissingRequired, "name must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::new(
            field,
            ErrorCode::InvalidShape,
            format!("'{name}' contains a character outside [A-Za-z0-9._-]"),
        ));
    }
    Ok(name.to_string())
}

/// Build the `workflow_type` field from a case-insensitive `chain`/`graph` string.
///
/// An empty (or all-whitespace) string defaults to `chain` rather than
/// erroring — the surface allows an absent/blank `type` key.
///
/// # Errors
/// `InvalidEnum` for any other string.
pub fn build_workflow_type(field: &str, raw: &str) -> Result<WorkflowType, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(WorkflowType::Chain),
        "chain" => Ok(WorkflowType::Chain),
        "graph" => Ok(WorkflowType::Graph),
        other => Err(ValidationError::new(
            field,
            ErrorCode::InvalidEnum,
            format!("expected 'chain' or 'graph', got '{other}'"),
        )),
    }
}

/// Build the normalized, lowercased `(key, value)` tag list.
///
/// Accepts a mapping (`key: value`), a sequence whose entries are each
/// `key:value`/`key=value` or a bare tag, or a single scalar holding several
/// tags separated by commas and/or whitespace (`"a, B c=D"`). Every key and
/// value is lowercased; a bare tag is stored with an empty value.
///
/// # Errors
/// `InvalidShape` if the node is neither a mapping nor a sequence/scalar of
/// strings.
pub fn build_tags(field: &str, value: &PolyValue) -> Result<Vec<(String, String)>, ValidationError> {
    if value.is_zero() {
        return Ok(Vec::new());
    }
    if let Some(scalar) = value.scalar_as_string() {
        return Ok(scalar
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(split_tag)
            .collect());
    }
    if let serde_yaml::Value::Mapping(_) = value.raw() {
        return value.as_string_map(field).map(|pairs| {
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_ascii_lowercase()))
                .collect()
        });
    }
    let raw_list = value.as_string_list(field)?;
    Ok(raw_list.iter().map(|entry| split_tag(entry)).collect())
}

fn split_tag(entry: &str) -> (String, String) {
    for sep in [':', '='] {
        if let Some((k, v)) = entry.split_once(sep) {
            return (k.trim().to_ascii_lowercase(), v.trim().to_ascii_lowercase());
        }
    }
    (entry.trim().to_ascii_lowercase(), String::new())
}

/// Build a worker selector from its polymorphic surface form.
///
/// A bare scalar `"local"` maps to [`WorkerSelector::None`] with
/// `force_local = true`; any other scalar or mapping becomes a one-entry or
/// multi-entry label set.
///
/// # Errors
/// `InvalidShape` if the node is a sequence.
pub fn build_worker_selector(
    field: &str,
    value: &PolyValue,
) -> Result<(WorkerSelector, bool), ValidationError> {
    if value.is_zero() {
        return Ok((WorkerSelector::None, false));
    }
    if let Some(scalar) = value.scalar_as_string() {
        if scalar.eq_ignore_ascii_case("local") {
            return Ok((WorkerSelector::None, true));
        }
        return Ok((WorkerSelector::Labels(vec![("type".into(), scalar)]), false));
    }
    let pairs = value.as_string_map(field)?;
    Ok((WorkerSelector::Labels(pairs), false))
}

/// Build a bounded, non-negative active-runs/active-steps count.
///
/// `0` means "unbounded" per the compiler's convention and is always valid;
/// any other value must be non-negative.
///
/// # Errors
/// `InvalidShape` if negative or not an integer.
pub fn build_bounded_count(field: &str, value: &PolyValue) -> Result<i64, ValidationError> {
    if value.is_zero() {
        return Ok(0);
    }
    let n = value.as_i64(field)?;
    if n < 0 {
        return Err(ValidationError::new(
            field,
            ErrorCode::InvalidShape,
            format!("must be >= 0, got {n}"),
        ));
    }
    Ok(n)
}

/// Build the `max_active_runs` count: `0` (or absent) becomes `1`; any other
/// value passes through. The caller decides whether to attach a deprecation
/// warning for `>1` or negative values (it depends on whether a `queue` is
/// configured, which this leaf builder doesn't know about).
///
/// # Errors
/// `InvalidShape` if the surface value isn't an integer.
pub fn build_max_active_runs(field: &str, value: Option<&PolyValue>) -> Result<(i64, bool), ValidationError> {
    let n = match value {
        None => return Ok((1, false)),
        Some(v) if v.is_zero() => 0,
        Some(v) => v.as_i64(field)?,
    };
    let n = if n == 0 { 1 } else { n };
    Ok((n, n > 1 || n < 0))
}

/// Build a `working_dir` value.
///
/// A path starting with `/`, `~`, or `$` is preserved verbatim for the
/// runtime to expand; any other non-empty path is joined against
/// `base_dir`; an empty path means "inherit" and yields `None`.
#[must_use]
pub fn build_working_dir(base_dir: &std::path::Path, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') || trimmed.starts_with('~') || trimmed.starts_with('$') {
        return Some(trimmed.to_string());
    }
    Some(base_dir.join(trimmed).to_string_lossy().into_owned())
}

/// Validate a `signal_on_stop` name against the recognized POSIX signal set.
///
/// # Errors
/// `InvalidSignal` for any name not in [`SIGNAL_NAMES`].
pub fn build_signal(field: &str, raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim().to_ascii_uppercase();
    if SIGNAL_NAMES.contains(&name.as_str()) {
        Ok(name)
    } else {
        Err(ValidationError::new(
            field,
            ErrorCode::InvalidSignal,
            format!("'{raw}' is not a recognized POSIX signal name"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(s: &str) -> PolyValue {
        PolyValue::decode(&serde_yaml::from_str(s).unwrap())
    }

    #[test]
    fn name_rejects_empty_and_bad_chars() {
        assert!(build_name("name", "").is_err());
        assert!(build_name("name", "bad name!").is_err());
        assert_eq!(build_name("name", "my-flow.v2").unwrap(), "my-flow.v2");
    }

    #[test]
    fn workflow_type_is_case_insensitive() {
        assert_eq!(build_workflow_type("type", "CHAIN").unwrap(), WorkflowType::Chain);
        assert!(build_workflow_type("type", "dag").is_err());
    }

    #[test]
    fn workflow_type_empty_string_defaults_to_chain() {
        assert_eq!(build_workflow_type("type", "").unwrap(), WorkflowType::Chain);
        assert_eq!(build_workflow_type("type", "   ").unwrap(), WorkflowType::Chain);
    }

    #[test]
    fn tags_split_on_colon_or_equals() {
        let tags = build_tags("tags", &poly("[\"env:Prod\", \"urgent\"]")).unwrap();
        assert_eq!(tags, vec![("env".into(), "prod".into()), ("urgent".into(), "".into())]);
    }

    #[test]
    fn tags_from_mapping() {
        let tags = build_tags("tags", &poly("env: Prod\n")).unwrap();
        assert_eq!(tags, vec![("env".into(), "prod".into())]);
    }

    #[test]
    fn tags_from_comma_separated_scalar() {
        let tags = build_tags("tags", &poly("\"a,B,c=D\"")).unwrap();
        assert_eq!(
            tags,
            vec![("a".into(), "".into()), ("b".into(), "".into()), ("c".into(), "d".into())]
        );
    }

    #[test]
    fn max_active_runs_zero_becomes_one_unflagged() {
        let (n, warn) = build_max_active_runs("max_active_runs", Some(&poly("0"))).unwrap();
        assert_eq!(n, 1);
        assert!(!warn);
    }

    #[test]
    fn max_active_runs_above_one_is_flagged() {
        let (n, warn) = build_max_active_runs("max_active_runs", Some(&poly("5"))).unwrap();
        assert_eq!(n, 5);
        assert!(warn);
    }

    #[test]
    fn max_active_runs_absent_defaults_to_one() {
        let (n, warn) = build_max_active_runs("max_active_runs", None).unwrap();
        assert_eq!(n, 1);
        assert!(!warn);
    }

    #[test]
    fn working_dir_preserves_deferred_forms_and_joins_relative() {
        let base = std::path::Path::new("/home/flows");
        assert_eq!(build_working_dir(base, "$WORK_DIR").as_deref(), Some("$WORK_DIR"));
        assert_eq!(build_working_dir(base, "~/out").as_deref(), Some("~/out"));
        assert_eq!(build_working_dir(base, "/abs").as_deref(), Some("/abs"));
        assert_eq!(build_working_dir(base, "").as_deref(), None);
        assert_eq!(
            build_working_dir(base, "out").as_deref(),
            Some("/home/flows/out")
        );
    }

    #[test]
    fn worker_selector_local_sets_force_local() {
        let (selector, force_local) = build_worker_selector("worker_selector", &poly("\"local\"")).unwrap();
        assert_eq!(selector, WorkerSelector::None);
        assert!(force_local);
    }

    #[test]
    fn bounded_count_rejects_negative() {
        assert!(build_bounded_count("max_active_runs", &poly("-1")).is_err());
        assert_eq!(build_bounded_count("max_active_runs", &poly("5")).unwrap(), 5);
    }

    #[test]
    fn signal_name_is_uppercased_and_validated() {
        assert_eq!(build_signal("signal_on_stop", "sigterm").unwrap(), "SIGTERM");
        assert!(build_signal("signal_on_stop", "SIGBOGUS").is_err());
    }
}
