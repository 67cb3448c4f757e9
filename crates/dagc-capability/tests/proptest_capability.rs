// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for the executor capability gate.

use dagc_capability::{capabilities_of, gate, Capability};
use proptest::prelude::*;

const ALL_CAPABILITIES: &[Capability] = &[
    Capability::Retry,
    Capability::Repeat,
    Capability::Container,
    Capability::OutputRedirect,
    Capability::WorkerSelector,
    Capability::Timeout,
    Capability::Output,
    Capability::Preconditions,
    Capability::Env,
    Capability::Shell,
    Capability::Parallel,
    Capability::MultipleCommands,
];

const EXECUTOR_TYPES: &[&str] = &["command", "container", "ssh", "mail", "http", "jq", "call", "hitl"];

fn arb_capability() -> impl Strategy<Value = Capability> {
    (0..ALL_CAPABILITIES.len()).prop_map(|i| ALL_CAPABILITIES[i])
}

fn arb_executor_type() -> impl Strategy<Value = &'static str> {
    (0..EXECUTOR_TYPES.len()).prop_map(|i| EXECUTOR_TYPES[i])
}

proptest! {
    // Testable property 5: executor capability. For every (executor, field)
    // pair where the capability is false, the gate flags it; when true, it
    // is satisfied. The registry is the single source of truth both ways.
    #[test]
    fn gate_agrees_with_the_capability_registry(
        executor_type in arb_executor_type(),
        cap in arb_capability(),
    ) {
        let result = gate(executor_type, &[(cap, "field")]);
        let supported = capabilities_of(executor_type).contains(&cap);
        prop_assert_eq!(result.is_compatible(), supported);
        if supported {
            prop_assert_eq!(result.satisfied, vec![cap]);
        } else {
            prop_assert_eq!(result.unsupported, vec![(cap, "field")]);
        }
    }

    #[test]
    fn unrecognized_executor_type_never_satisfies_anything(cap in arb_capability()) {
        let result = gate("definitely-not-an-executor", &[(cap, "field")]);
        prop_assert!(!result.is_compatible());
    }

    #[test]
    fn gate_is_order_preserving(caps in prop::collection::vec(arb_capability(), 0..8)) {
        let requested: Vec<_> = caps.iter().map(|c| (*c, "field")).collect();
        let result = gate("command", &requested);
        // command supports every capability but Container; the ones it
        // satisfies come back in request order.
        let expected_satisfied: Vec<_> = caps.iter().copied().filter(|c| *c != Capability::Container).collect();
        prop_assert_eq!(result.satisfied, expected_satisfied);
    }
}
