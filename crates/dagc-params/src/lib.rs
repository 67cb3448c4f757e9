// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]
//! Parameter tokenizing, override merging, and JSON-Schema validation
//! (component F).
//!
//! A workflow's `params` field accepts a shell-like string (`KEY=value
//! other "quoted value"`), a mapping, or a raw JSON object passed straight
//! through. This crate turns any of those into an ordered [`Param`] list and
//! a canonical `params_json` object, merges CLI-supplied overrides over the
//! declared defaults, and optionally validates the result against a
//! JSON Schema.

mod schema;
mod tokenize;

pub use schema::{FileSchemaSource, SchemaSource};
#[cfg(feature = "schema-http")]
pub use schema::UrlSchemaSource;
pub use tokenize::tokenize;

use dagc_core::{ErrorCode, Param, ValidationError};

/// Parse a shell-like parameter string into an ordered [`Param`] list.
///
/// Each token is either `KEY=value` (a named parameter) or a bare value (a
/// positional parameter, assigned the implicit name `$1`, `$2`, ...).
///
/// # Errors
/// `InvalidShape` if the string cannot be tokenized (unbalanced quotes).
pub fn parse_params_string(field: &str, raw: &str) -> Result<Vec<Param>, ValidationError> {
    let tokens = tokenize(raw).map_err(|msg| ValidationError::new(field, ErrorCode::InvalidShape, msg))?;
    let mut positional_index = 0usize;
    let mut params = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some((key, value)) = split_named(&token) {
            params.push(Param {
                name: key,
                value,
                positional: false,
            });
        } else {
            positional_index += 1;
            params.push(Param {
                name: format!("${positional_index}"),
                value: token,
                positional: true,
            });
        }
    }
    Ok(params)
}

/// `KEY=value` split that requires a non-empty, identifier-shaped key so a
/// bare value containing `=` (e.g. a URL query string) is not mistaken for
/// a named parameter.
fn split_named(token: &str) -> Option<(String, String)> {
    let (key, value) = token.split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    if key.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Build the canonical `params_json` object from a resolved [`Param`] list.
#[must_use]
pub fn params_to_json(params: &[Param]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for p in params {
        map.insert(p.name.clone(), coerce_json_scalar(&p.value));
    }
    serde_json::Value::Object(map)
}

/// Coerce a parameter value to JSON, passing through anything that already
/// parses as JSON and falling back to a plain string otherwise.
#[must_use]
pub fn coerce_json_scalar(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return serde_json::Value::String(String::new());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Merge CLI-supplied overrides over a workflow's declared parameters.
///
/// Overrides replace a same-named declared parameter's value in place
/// (preserving its original position); an override with no matching
/// declared parameter is appended at the end as a new named parameter.
#[must_use]
pub fn apply_overrides(base: Vec<Param>, overrides: Vec<Param>) -> Vec<Param> {
    let mut result = base;
    for over in overrides {
        if let Some(existing) = result.iter_mut().find(|p| p.name == over.name) {
            existing.value = over.value;
        } else {
            result.push(over);
        }
    }
    result
}

/// Materialize JSON-Schema property defaults as [`Param`] pairs.
///
/// Only properties absent from `existing` (by name) get a pair; a parameter
/// the surface document already declares always wins over its schema
/// default.
#[must_use]
pub fn materialize_schema_defaults(schema: &serde_json::Value, existing: &[Param]) -> Vec<Param> {
    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Vec::new();
    };
    properties
        .iter()
        .filter(|(name, _)| !existing.iter().any(|p| &p.name == *name))
        .filter_map(|(name, prop)| {
            let default = prop.get("default")?;
            let value = match default {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(Param {
                name: name.clone(),
                value,
                positional: false,
            })
        })
        .collect()
}

/// Validate a resolved `params_json` object against a JSON Schema.
///
/// # Errors
/// `SchemaValidationFailure` naming the first violated schema path.
pub fn validate_against_schema(
    params_json: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), ValidationError> {
    let compiled = jsonschema::validator_for(schema).map_err(|e| {
        ValidationError::new("params", ErrorCode::SchemaLoadFailure, e.to_string())
    })?;
    let mut errors = compiled.iter_errors(params_json).peekable();
    if errors.peek().is_none() {
        return Ok(());
    }
    let first = errors.next().unwrap();
    Err(ValidationError::new(
        format!("params{}", first.instance_path),
        ErrorCode::SchemaValidationFailure,
        first.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_named_and_positional_mix() {
        let params = parse_params_string("params", "FOO=bar baz \"quoted value\"").unwrap();
        assert_eq!(params[0].name, "FOO");
        assert_eq!(params[0].value, "bar");
        assert!(!params[0].positional);
        assert_eq!(params[1].name, "$1");
        assert_eq!(params[1].value, "baz");
        assert_eq!(params[2].value, "quoted value");
    }

    #[test]
    fn url_like_value_is_not_mistaken_for_named() {
        let params = parse_params_string("params", "https://x/y?a=1").unwrap();
        assert!(params[0].positional);
    }

    #[test]
    fn overrides_replace_in_place_and_append_new() {
        let base = vec![
            Param {
                name: "A".into(),
                value: "1".into(),
                positional: false,
            },
            Param {
                name: "B".into(),
                value: "2".into(),
                positional: false,
            },
        ];
        let overrides = vec![
            Param {
                name: "B".into(),
                value: "20".into(),
                positional: false,
            },
            Param {
                name: "C".into(),
                value: "3".into(),
                positional: false,
            },
        ];
        let merged = apply_overrides(base, overrides);
        assert_eq!(merged[0].value, "1");
        assert_eq!(merged[1].value, "20");
        assert_eq!(merged[2].name, "C");
    }

    #[test]
    fn coerce_json_scalar_parses_numbers_and_falls_back_to_string() {
        assert_eq!(coerce_json_scalar("42"), serde_json::json!(42));
        assert_eq!(coerce_json_scalar("my-value"), serde_json::json!("my-value"));
    }

    #[test]
    fn schema_defaults_materialize_for_absent_names_only() {
        let schema = serde_json::json!({
            "properties": {
                "region": {"type": "string", "default": "us-east"},
                "replicas": {"type": "integer", "default": 3},
                "name": {"type": "string"}
            }
        });
        let existing = vec![Param {
            name: "region".into(),
            value: "eu-west".into(),
            positional: false,
        }];
        let defaults = materialize_schema_defaults(&schema, &existing);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "replicas");
        assert_eq!(defaults[0].value, "3");
    }

    #[test]
    fn schema_validation_reports_first_violation() {
        let schema = serde_json::json!({
            "type": "object",
            "required": ["name"],
        });
        let err = validate_against_schema(&serde_json::json!({}), &schema).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaValidationFailure);
    }
}
