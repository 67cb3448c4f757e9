// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chain-mode implicit dependencies and router-step lowering (component E).
//!
//! Two independent rewrites live here, both run after the step compiler has
//! produced each [`Step`] but before cross-cutting DAG validation:
//!
//! - [`apply_chain_dependencies`]: in [`WorkflowType::Chain`] workflows, a
//!   step with no explicit `depends` implicitly depends on its immediate
//!   predecessor. A step that declares `depends: []` is a fan-in root: it
//!   gets no implicit dependency, and the step after it chains from it as
//!   the new predecessor.
//! - [`lower_router`]: a router step's routes are rewritten into ordinary
//!   dependency and precondition edges so the rest of the compiler never
//!   needs to know routers exist. Each route target gets an implicit
//!   dependency on the router step, a precondition that the router's value
//!   matched its route pattern, and `continue_on.skipped = true` so an
//!   untaken route does not fail the run. The router step itself also gets
//!   `continue_on.skipped = true` so its own downstream edges survive a run
//!   where none of its routes match.

use crate::aggregate::ErrorAggregator;
use crate::error::{ErrorCode, ValidationError};
use crate::{Precondition, Step, WorkflowType};

/// Reject explicit `depends` and router steps in chain-mode workflows.
///
/// Must run before [`apply_chain_dependencies`], which would otherwise give
/// every step a non-empty `depends` and make "explicit vs. implicit"
/// indistinguishable afterward. No-op for [`WorkflowType::Graph`].
pub fn validate_chain_mode(workflow_type: WorkflowType, steps: &[Step], errors: &mut ErrorAggregator) {
    if workflow_type != WorkflowType::Chain {
        return;
    }
    for (i, step) in steps.iter().enumerate() {
        if !step.depends.is_empty() {
            errors.push(ValidationError::new(
                format!("steps[{i}].depends"),
                ErrorCode::Conflict,
                "chain-mode workflows do not allow explicit 'depends'; steps chain implicitly in declaration order",
            ));
        }
        if step.router.is_some() {
            errors.push(ValidationError::new(
                format!("steps[{i}].router"),
                ErrorCode::Conflict,
                "chain-mode workflows do not allow router steps",
            ));
        }
    }
}

/// Inject implicit `depends` edges for chain-mode workflows.
///
/// No-op for [`WorkflowType::Graph`]: graph mode requires explicit `depends`
/// everywhere and never infers an edge from declaration order.
pub fn apply_chain_dependencies(workflow_type: WorkflowType, steps: &mut [Step]) {
    if workflow_type != WorkflowType::Chain {
        return;
    }
    let mut predecessor: Option<String> = None;
    for step in steps.iter_mut() {
        if step.depends.is_empty() && !step.explicitly_no_deps {
            if let Some(prev) = &predecessor {
                step.depends.push(prev.clone());
            }
        }
        predecessor = Some(step.name.clone());
    }
}

/// Rewrite every router step's routes into dependency and precondition edges
/// on the target steps, in place.
///
/// `steps` must already contain every target by name; this function does not
/// check for dangling references — that is the DAG compiler's job once every
/// step's edges are in their final form.
pub fn lower_router(steps: &mut [Step], errors: &mut ErrorAggregator) {
    let routers: Vec<(usize, String, Vec<(String, Vec<String>)>)> = steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            s.router
                .as_ref()
                .map(|r| (i, r.value.clone(), r.routes.iter().map(|rt| (rt.pattern.clone(), rt.targets.clone())).collect()))
        })
        .collect();

    for (router_idx, value_expr, routes) in routers {
        let router_name = steps[router_idx].name.clone();
        steps[router_idx].continue_on.skipped = true;
        let mut seen_targets = std::collections::HashSet::new();
        for (pattern, targets) in &routes {
            for target in targets {
                if !seen_targets.insert(target.clone()) {
                    errors.push(ValidationError::new(
                        format!("steps[{router_idx}].router.routes"),
                        ErrorCode::DuplicateName,
                        format!("target '{target}' appears in more than one route of router '{router_name}'"),
                    ));
                    continue;
                }
                if let Some(target_step) = steps.iter_mut().find(|s| &s.name == target) {
                    if !target_step.depends.contains(&router_name) {
                        target_step.depends.push(router_name.clone());
                    }
                    target_step.preconditions.push(Precondition {
                        condition: value_expr.clone(),
                        expected: pattern.clone(),
                    });
                    target_step.continue_on.skipped = true;
                }
            }
        }
    }
}
