// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for the leaf value builders.

use dagc_build::{build_tags, build_workflow_type};
use dagc_core::decode::PolyValue;
use proptest::prelude::*;

fn arb_tag_component() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,8}".prop_filter("no separator chars", |s| {
        !s.contains([',', ':', '=']) && !s.chars().any(char::is_whitespace)
    })
}

fn arb_tag_entry() -> impl Strategy<Value = (String, Option<String>)> {
    prop_oneof![
        arb_tag_component().prop_map(|k| (k, None)),
        (arb_tag_component(), arb_tag_component()).prop_map(|(k, v)| (k, Some(v))),
    ]
}

proptest! {
    // Testable property 2: tag round-trip. For `a,B,c=D` the output is
    // exactly `[(a,""),(b,""),(c,"d")]` — every key/value lowercased, a
    // bare entry gets an empty value.
    #[test]
    fn tag_round_trip_lowercases_keys_and_values(entries in prop::collection::vec(arb_tag_entry(), 1..6)) {
        let raw = entries
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{k}={v}"),
                None => k.clone(),
            })
            .collect::<Vec<_>>()
            .join(",");
        let expected: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone().unwrap_or_default().to_ascii_lowercase()))
            .collect();

        let value = PolyValue::decode(&serde_yaml::Value::String(raw));
        let tags = build_tags("tags", &value).unwrap();
        prop_assert_eq!(tags, expected);
    }

    #[test]
    fn workflow_type_is_case_insensitive(upper in prop::bool::ANY) {
        let raw = if upper { "CHAIN" } else { "chain" };
        let parsed = build_workflow_type("type", raw).unwrap();
        prop_assert_eq!(parsed, dagc_core::WorkflowType::Chain);
    }

    #[test]
    fn blank_workflow_type_never_errors(whitespace_count in 0usize..5) {
        let raw = " ".repeat(whitespace_count);
        prop_assert_eq!(build_workflow_type("type", &raw).unwrap(), dagc_core::WorkflowType::Chain);
    }
}
