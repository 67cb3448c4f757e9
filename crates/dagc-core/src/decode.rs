// SPDX-License-Identifier: MIT OR Apache-2.0
//! Polymorphic value decoders (component A).
//!
//! Many surface fields accept a string, a sequence, a mapping, or a numeric
//! scalar. [`PolyValue`] wraps a raw YAML node, remembers which shape it
//! arrived in, and exposes typed accessors that coerce to the shape a
//! particular field needs. The raw discriminator is never discarded: error
//! messages need to say what shape was actually found.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ValidationError};

/// Which surface shape a [`PolyValue`] was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    /// A bare string, number, or boolean.
    Scalar,
    /// A YAML sequence.
    Sequence,
    /// A YAML mapping.
    Mapping,
    /// Absent / YAML null — the field's zero value.
    Null,
}

impl RawKind {
    /// Classify a raw YAML node's shape.
    #[must_use]
    pub fn of(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Sequence(_) => Self::Sequence,
            serde_yaml::Value::Mapping(_) => Self::Mapping,
            _ => Self::Scalar,
        }
    }
}

impl std::fmt::Display for RawKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scalar => "scalar",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Null => "null",
        };
        f.write_str(s)
    }
}

/// The one fatal-early error the compiler can raise: the surface document
/// is not a mapping at all, so no field path can even be formed and every
/// other transformer would have nothing to read from.
///
/// Everything else the compiler finds goes through
/// [`crate::aggregate::ErrorAggregator`] instead of being raised eagerly.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The top-level surface document was not a mapping.
    #[error("surface document must be a mapping, got {0}")]
    NotAMapping(RawKind),
}

/// Confirm the top-level surface document is a mapping, returning it.
///
/// # Errors
/// [`DecodeError::NotAMapping`] otherwise.
pub fn decode_document(raw: &serde_yaml::Value) -> Result<&serde_yaml::Mapping, DecodeError> {
    match raw {
        serde_yaml::Value::Mapping(m) => Ok(m),
        other => Err(DecodeError::NotAMapping(RawKind::of(other))),
    }
}

/// A surface value whose shape is one of several accepted union members.
///
/// `PolyValue` never loses the original node: [`PolyValue::raw_kind`] and
/// [`PolyValue::raw`] are always available so callers can build precise
/// `InvalidShape` errors.
#[derive(Debug, Clone)]
pub struct PolyValue {
    raw_kind: RawKind,
    raw: serde_yaml::Value,
}

impl PolyValue {
    /// Wrap a raw YAML node. This never fails — shape acceptance is the
    /// accessor's job, not the constructor's, so one `PolyValue` can be
    /// tried against several candidate shapes.
    #[must_use]
    pub fn decode(raw: &serde_yaml::Value) -> Self {
        Self {
            raw_kind: RawKind::of(raw),
            raw: raw.clone(),
        }
    }

    /// The shape this value was decoded from.
    #[must_use]
    pub fn raw_kind(&self) -> RawKind {
        self.raw_kind
    }

    /// The underlying YAML node.
    #[must_use]
    pub fn raw(&self) -> &serde_yaml::Value {
        &self.raw
    }

    /// `true` when the field was absent (null / not present in the mapping).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw_kind == RawKind::Null
    }

    fn shape_error(&self, field: &str) -> ValidationError {
        ValidationError::new(
            field,
            ErrorCode::InvalidShape,
            format!("expected string, sequence, or mapping; got {}", self.raw_kind),
        )
    }

    /// Coerce a scalar node to its string form (numbers and booleans are
    /// stringified; this is used by fields that accept `string OR number`).
    #[must_use]
    pub fn scalar_as_string(&self) -> Option<String> {
        match &self.raw {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Coerce to an integer, accepting a numeric scalar or a numeric string.
    ///
    /// # Errors
    /// Returns `InvalidShape` when the node is a sequence/mapping, and the
    /// caller is expected to turn a non-numeric string into a deferred
    /// expression rather than calling this accessor.
    pub fn as_i64(&self, field: &str) -> Result<i64, ValidationError> {
        match &self.raw {
            serde_yaml::Value::Number(n) if n.is_i64() => Ok(n.as_i64().unwrap()),
            serde_yaml::Value::Number(n) if n.is_u64() => Ok(n.as_u64().unwrap() as i64),
            serde_yaml::Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                ValidationError::new(
                    field,
                    ErrorCode::InvalidShape,
                    format!("expected an integer, got '{s}'"),
                )
            }),
            _ => Err(self.shape_error(field)),
        }
    }

    /// Coerce to a string list: a scalar becomes a single-element list; a
    /// sequence has each element coerced to a string; a mapping is rejected.
    ///
    /// # Errors
    /// `InvalidShape` if this is a mapping, or if any sequence element is
    /// itself not a scalar.
    pub fn as_string_list(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        match &self.raw {
            serde_yaml::Value::Null => Ok(Vec::new()),
            serde_yaml::Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    PolyValue::decode(v).scalar_as_string().ok_or_else(|| {
                        ValidationError::new(
                            format!("{field}[{i}]"),
                            ErrorCode::InvalidShape,
                            "expected a string element",
                        )
                    })
                })
                .collect(),
            serde_yaml::Value::Mapping(_) => Err(self.shape_error(field)),
            _ => Ok(self
                .scalar_as_string()
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect()),
        }
    }

    /// Coerce to an ordered list of string pairs.
    ///
    /// Accepts:
    /// - a mapping (YAML mappings preserve declaration order),
    /// - a sequence of single-key mappings (`- KEY: value`),
    /// - a sequence of `KEY=value` strings,
    /// - a single `KEY=value` scalar string.
    ///
    /// Declaration order is preserved in all four forms, which is required
    /// for env scoping (later entries may reference earlier ones).
    ///
    /// # Errors
    /// `InvalidShape` if an entry cannot be split into a key and a value.
    pub fn as_ordered_pairs(&self, field: &str) -> Result<Vec<(String, String)>, ValidationError> {
        match &self.raw {
            serde_yaml::Value::Null => Ok(Vec::new()),
            serde_yaml::Value::Mapping(map) => map
                .iter()
                .map(|(k, v)| {
                    let key = k.as_str().unwrap_or_default().to_string();
                    let value = PolyValue::decode(v).scalar_as_string().unwrap_or_default();
                    Ok((key, value))
                })
                .collect(),
            serde_yaml::Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Self::pair_from_node(item, field, i))
                .collect(),
            serde_yaml::Value::String(s) => Self::pair_from_kv_string(s, field, 0).map(|p| vec![p]),
            _ => Err(self.shape_error(field)),
        }
    }

    fn pair_from_node(
        node: &serde_yaml::Value,
        field: &str,
        index: usize,
    ) -> Result<(String, String), ValidationError> {
        match node {
            serde_yaml::Value::Mapping(m) if m.len() == 1 => {
                let (k, v) = m.iter().next().unwrap();
                let key = k.as_str().unwrap_or_default().to_string();
                let value = PolyValue::decode(v).scalar_as_string().unwrap_or_default();
                Ok((key, value))
            }
            serde_yaml::Value::String(s) => Self::pair_from_kv_string(s, field, index),
            _ => Err(ValidationError::new(
                format!("{field}[{index}]"),
                ErrorCode::InvalidShape,
                "expected a single-key mapping or 'KEY=value' string",
            )),
        }
    }

    fn pair_from_kv_string(
        s: &str,
        field: &str,
        index: usize,
    ) -> Result<(String, String), ValidationError> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.to_string()))
            .ok_or_else(|| {
                ValidationError::new(
                    format!("{field}[{index}]"),
                    ErrorCode::InvalidShape,
                    format!("expected 'KEY=value', got '{s}'"),
                )
            })
    }

    /// Coerce to a string-valued mapping. Only a mapping node is accepted.
    ///
    /// # Errors
    /// `InvalidShape` if this is not a mapping.
    pub fn as_string_map(&self, field: &str) -> Result<Vec<(String, String)>, ValidationError> {
        match &self.raw {
            serde_yaml::Value::Null => Ok(Vec::new()),
            serde_yaml::Value::Mapping(_) => self.as_ordered_pairs(field),
            _ => Err(self.shape_error(field)),
        }
    }
}
