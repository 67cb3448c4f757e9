// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for parameter tokenizing and override merging.

use dagc_core::Param;
use dagc_params::{apply_overrides, parse_params_string, tokenize};
use proptest::prelude::*;

fn arb_ident() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,6}"
}

fn arb_value() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

proptest! {
    // Tokenizing a plain `KEY=value` pair never errors and round-trips the
    // pair unchanged for identifier-shaped keys and unquoted values.
    #[test]
    fn simple_named_pairs_tokenize_without_error(
        pairs in prop::collection::vec((arb_ident(), arb_value()), 1..6),
    ) {
        let raw = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        let tokens = tokenize(&raw).unwrap();
        prop_assert_eq!(tokens.len(), pairs.len());
        for (token, (k, v)) in tokens.iter().zip(pairs.iter()) {
            prop_assert_eq!(token, &format!("{k}={v}"));
        }
    }

    #[test]
    fn parse_params_string_names_every_pair(
        pairs in prop::collection::vec((arb_ident(), arb_value()), 1..6),
    ) {
        let raw = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        let params = parse_params_string("params", &raw).unwrap();
        prop_assert_eq!(params.len(), pairs.len());
        for (param, (k, v)) in params.iter().zip(pairs.iter()) {
            prop_assert_eq!(&param.name, k);
            prop_assert_eq!(&param.value, v);
            prop_assert!(!param.positional);
        }
    }

    // Testable property 7 (generalized): an override replaces a same-named
    // declared parameter in place and is otherwise appended, regardless of
    // how many declared/override pairs are involved.
    #[test]
    fn override_replaces_in_place_or_appends(
        base in prop::collection::vec((arb_ident(), arb_value()), 0..5),
        overrides in prop::collection::vec((arb_ident(), arb_value()), 0..5),
    ) {
        let base_params: Vec<Param> = base
            .iter()
            .map(|(n, v)| Param { name: n.clone(), value: v.clone(), positional: false })
            .collect();
        let override_params: Vec<Param> = overrides
            .iter()
            .map(|(n, v)| Param { name: n.clone(), value: v.clone(), positional: false })
            .collect();

        let base_names: Vec<String> = base.iter().map(|(n, _)| n.clone()).collect();
        let merged = apply_overrides(base_params, override_params);

        // Every base name is still present, in its original position.
        for (i, name) in base_names.iter().enumerate() {
            prop_assert_eq!(&merged[i].name, name);
        }
        // The merged length never drops below the base length, and only
        // grows by names the base didn't already have.
        prop_assert!(merged.len() >= base_names.len());

        // The final value for each override name matches the *last*
        // override entry with that name (later entries win ties), unless
        // the name was never in the overrides at all.
        for (name, _) in &overrides {
            if let Some(last) = overrides.iter().rev().find(|(n, _)| n == name) {
                let found = merged.iter().find(|p| &p.name == name).unwrap();
                prop_assert_eq!(&found.value, &last.1);
            }
        }
    }
}
