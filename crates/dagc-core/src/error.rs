// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error catalog for the DAG specification compiler.
//!
//! Every error the compiler can produce is one of the [`ErrorCode`] kinds
//! below. A [`ValidationError`] pairs a kind with the field path and value
//! that triggered it; these are the atoms the error aggregator
//! ([`crate::aggregate`]) collects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of problem a [`ValidationError`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A polymorphic value decoder received a YAML node shape it does not accept.
    InvalidShape,
    /// An enum-valued field held a string outside its allowed set.
    InvalidEnum,
    /// A required field was absent.
    MissingRequired,
    /// Two mutually-exclusive fields (or execution-type groups) were both set.
    Conflict,
    /// A surface key is not recognized (possibly a legacy spelling).
    UnknownKey,
    /// Two entities that must be unique (steps, router targets) share a name.
    DuplicateName,
    /// A reference (dependency, router target) does not resolve to an existing step.
    DanglingReference,
    /// The step dependency graph contains a cycle.
    CycleDetected,
    /// A cron expression failed to parse.
    InvalidSchedule,
    /// A duration string failed to parse against the suffix grammar.
    InvalidDuration,
    /// A signal name is not among the recognized POSIX signal names.
    InvalidSignal,
    /// A step populated a field its resolved executor does not support.
    UnsupportedByExecutor,
    /// A referenced JSON Schema could not be loaded.
    SchemaLoadFailure,
    /// A parameter set failed JSON-Schema validation.
    SchemaValidationFailure,
}

impl ErrorCode {
    /// Short machine-stable tag, used in CLI output and snapshot tests.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::InvalidShape => "invalid_shape",
            Self::InvalidEnum => "invalid_enum",
            Self::MissingRequired => "missing_required",
            Self::Conflict => "conflict",
            Self::UnknownKey => "unknown_key",
            Self::DuplicateName => "duplicate_name",
            Self::DanglingReference => "dangling_reference",
            Self::CycleDetected => "cycle_detected",
            Self::InvalidSchedule => "invalid_schedule",
            Self::InvalidDuration => "invalid_duration",
            Self::InvalidSignal => "invalid_signal",
            Self::UnsupportedByExecutor => "unsupported_by_executor",
            Self::SchemaLoadFailure => "schema_load_failure",
            Self::SchemaValidationFailure => "schema_validation_failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single validation failure, scoped to the field path that produced it.
///
/// `ValidationError`s are never raised eagerly except for the one fatal-early
/// path (a structural decode failure, see [`crate::decode::DecodeError`]) —
/// every other producer appends to a [`crate::aggregate::ErrorAggregator`]
/// and keeps going, per the compiler's collect-don't-short-circuit contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dot-delimited path to the offending field, e.g. `"steps[2].retry_policy.limit"`.
    pub field: String,
    /// The kind of problem.
    pub code: ErrorCode,
    /// The offending value, when it can be captured as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Additional human-readable detail (the wrapped message).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<String>,
}

impl ValidationError {
    /// Construct a bare validation error with no captured value.
    #[must_use]
    pub fn new(field: impl Into<String>, code: ErrorCode, wrapped: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            value: None,
            wrapped: Some(wrapped.into()),
        }
    }

    /// Attach a captured offending value to this error.
    #[must_use]
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.code)?;
        if let Some(ref msg) = self.wrapped {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
