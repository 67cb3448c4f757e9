// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error aggregation for the DAG specification compiler.
//!
//! The compiler never stops at the first problem it finds (outside the one
//! fatal-early decode path, see [`crate::decode::DecodeError`]): every
//! transformer appends to an [`ErrorAggregator`], which preserves
//! first-seen order and is handed back to the caller as a single composite
//! error.

use std::fmt;

use crate::error::{ErrorCode, ValidationError};

/// Static table mapping a recognized legacy `camelCase` spelling to its
/// canonical `snake_case` form.
///
/// New surface documents must use the canonical spelling; this table only
/// powers the diagnostic hint attached to [`ErrorCode::UnknownKey`] errors,
/// per the Open Question in the specification: legacy keys are a hint, not
/// a silently-accepted alias.
pub const LEGACY_KEY_TABLE: &[(&str, &str)] = &[
    ("workingDir", "working_dir"),
    ("skipIfSuccessful", "skip_if_successful"),
    ("catchupWindow", "catchup_window"),
    ("overlapPolicy", "overlap_policy"),
    ("logDir", "log_dir"),
    ("logOutput", "log_output"),
    ("handlerOn", "handler_on"),
    ("mailOn", "mail_on"),
    ("errorMail", "error_mail"),
    ("infoMail", "info_mail"),
    ("waitMail", "wait_mail"),
    ("timeoutSec", "timeout_sec"),
    ("delaySec", "delay_sec"),
    ("restartWaitSec", "restart_wait_sec"),
    ("histRetentionDays", "hist_retention_days"),
    ("maxActiveRuns", "max_active_runs"),
    ("maxActiveSteps", "max_active_steps"),
    ("maxCleanUpTimeSec", "max_clean_up_time_sec"),
    ("maxOutputSize", "max_output_size"),
    ("workerSelector", "worker_selector"),
    ("runConfig", "run_config"),
    ("registryAuths", "registry_auths"),
    ("signalOnStop", "signal_on_stop"),
    ("retryPolicy", "retry_policy"),
    ("repeatPolicy", "repeat_policy"),
    ("mailOnError", "mail_on_error"),
    ("continueOn", "continue_on"),
    ("shellPackages", "shell_packages"),
    // Compatibility hints only — never accepted transparently, per the
    // Open Question in the specification.
    ("dir", "working_dir"),
    ("run", "call"),
];

/// Look up the canonical spelling for a recognized legacy key.
#[must_use]
pub fn legacy_hint(key: &str) -> Option<&'static str> {
    LEGACY_KEY_TABLE
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, canonical)| *canonical)
}

/// Walk every key of `raw` (a mapping; a no-op for any other shape) and push
/// an `UnknownKey` error for each one absent from `known_keys`.
///
/// [`ErrorAggregator::push`] attaches the legacy-spelling hint from
/// [`LEGACY_KEY_TABLE`] automatically, so a document using e.g. `workingDir`
/// gets a "did you mean 'working_dir'" hint rather than a bare rejection.
pub fn check_unknown_keys(
    field_prefix: &str,
    raw: &serde_yaml::Value,
    known_keys: &[&str],
    errors: &mut ErrorAggregator,
) {
    let Some(map) = raw.as_mapping() else {
        return;
    };
    for key in map.keys() {
        let Some(key) = key.as_str() else {
            continue;
        };
        if !known_keys.contains(&key) {
            errors.push(ValidationError::new(
                format!("{field_prefix}.{key}"),
                ErrorCode::UnknownKey,
                "unrecognized key",
            ));
        }
    }
}

/// Accumulates [`ValidationError`]s across a single compile, in first-seen
/// order, without ever short-circuiting on the first failure.
#[derive(Debug, Clone, Default)]
pub struct ErrorAggregator {
    errors: Vec<ValidationError>,
}

impl ErrorAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error, applying the legacy-key hint when applicable.
    pub fn push(&mut self, mut error: ValidationError) {
        if error.code == ErrorCode::UnknownKey {
            if let Some(hint) = field_tail(&error.field).and_then(legacy_hint) {
                let suggestion = format!("use snake_case; '{}' -> '{hint}'", field_tail(&error.field));
                error.wrapped = Some(match error.wrapped.take() {
                    Some(existing) => format!("{existing} ({suggestion})"),
                    None => suggestion,
                });
            }
        }
        self.errors.push(error);
    }

    /// Append every error from another collection, preserving order.
    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for e in errors {
            self.push(e);
        }
    }

    /// `true` when no errors have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Borrow the accumulated errors in first-seen order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consume the aggregator, returning `Ok(())` if empty or the composite
    /// error otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CompositeError`] wrapping every accumulated error when the
    /// aggregator is non-empty.
    pub fn into_result(self) -> Result<(), CompositeError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CompositeError {
                errors: self.errors,
            })
        }
    }

    /// Consume the aggregator, returning the raw `Vec` regardless of emptiness.
    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

fn field_tail(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

/// A composite error wrapping every [`ValidationError`] accumulated during a
/// compile, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeError {
    errors: Vec<ValidationError>,
}

impl CompositeError {
    /// The individual errors, in first-seen order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consume into the underlying `Vec`.
    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} error(s) while compiling workflow:", self.errors.len())?;
        for e in &self.errors {
            writeln!(f, "  - {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompositeError {}
