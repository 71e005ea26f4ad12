//! Rule-propagation solver.
//!
//! ## Key concepts
//!
//! - **Target**: an undecomposed formula on an open branch, with its position
//!   on that branch.
//! - **Containers**: one queue of targets per rule, indexed by [`RuleId`].
//!   A formula sits in the queue of the rule `find_rule` picks for it.
//! - **Propagation**: pop targets of one rule until its queue is empty. Every
//!   application may close branches, fork them and create new targets.
//! - **Priority walk**: at a node of the [`RuleIndex`] the solver saturates
//!   every rule on the path from the root, then descends into the children.
//!   A child that fails is rolled back to the snapshot taken when it was
//!   entered.
//!
//! ```text
//! open leaves ── group_by_rule ──> containers
//!                                      │
//!          ┌───────────── solve_from(rule) ◀──────────────┐
//!          │  propagate_rule(r) for r in path(rule)       │
//!          │    strict(target) -> append -> closure       │
//!          │    fork: multiply pending targets            │
//!          │    new formulas: append_by_rules             │
//!          └── tree closed? done : children ──────────────┘
//! ```
//!
//! Propositional rules strictly shrink formulas, so propagation always
//! terminates and every branch ends up closed by contradiction or emptiness.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::debug;

use super::{PassMetrics, Proof, RuleId, RuleIndex, SolveMetrics, canonical_key};
use crate::system::FormalSystem;
use crate::{BranchId, Decisions, EngineError, Formula, HistoryOp, UsedRule};

/// Undecomposed formula waiting for its rule.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    formula: Formula,
    branch: BranchId,
    position: usize,
}

pub(crate) type Containers = Vec<Vec<Target>>;

pub(crate) fn solve(proof: &mut Proof) -> Result<(bool, SolveMetrics), EngineError> {
    let start = Instant::now();
    let mut metrics = SolveMetrics::default();

    for branch in proof.tree.branch_ids() {
        proof.deal_closure(branch)?;
    }
    if proof.is_closed() {
        metrics.total = start.elapsed();
        return Ok((true, metrics));
    }

    let system = proof.system.clone();
    let index = system.rule_index();
    let containers = group_by_rule(proof, system.as_ref(), index)?;
    let closed = solve_from(proof, system.as_ref(), index.root(), containers, &mut metrics)?;

    metrics.total = start.elapsed();
    debug!(closed, applications = metrics.applications, backtracks = metrics.backtracks, "solver finished");
    Ok((closed, metrics))
}

fn solve_from(
    proof: &mut Proof,
    system: &dyn FormalSystem,
    rule: RuleId,
    mut containers: Containers,
    metrics: &mut SolveMetrics,
) -> Result<bool, EngineError> {
    let index = system.rule_index();
    let start_rules = proof.used_rules.len();
    let start_layer = proof.tree.last_layer();

    loop {
        let mut progressed = false;
        for &id in index.path(rule) {
            if containers[id].is_empty() {
                continue;
            }
            propagate_rule(proof, system, id, &mut containers, metrics)?;
            progressed = true;
            if proof.is_closed() {
                return Ok(true);
            }
        }
        if !progressed {
            break;
        }
    }

    for &child in index.children(rule) {
        if solve_from(proof, system, child, containers.clone(), metrics)? {
            return Ok(true);
        }
    }

    if proof.used_rules.len() > start_rules {
        debug!(rule = index.name(rule), undone = proof.used_rules.len() - start_rules, "backtracking");
        proof.used_rules.truncate(start_rules);
        proof.tree.prune_from(start_layer + 1);
        metrics.backtracks += 1;
    }
    Ok(false)
}

/// Bucket every undecomposed formula of every open branch by its rule.
fn group_by_rule(proof: &Proof, system: &dyn FormalSystem, index: &RuleIndex) -> Result<Containers, EngineError> {
    let mut containers: Containers = vec![Vec::new(); index.len()];
    for branch in proof.tree.branch_ids() {
        if proof.tree.is_branch_closed(branch) {
            continue;
        }
        let leaf = proof.tree.leaf_node(branch)?;
        for (position, formula) in proof.tree.branch_formulas(branch)?.into_iter().enumerate() {
            if leaf.history.contains(&formula) {
                continue;
            }
            if let Some(id) = system.find_rule(&formula).and_then(|name| index.id(name)) {
                containers[id].push(Target { formula, branch, position });
            }
        }
    }
    Ok(containers)
}

/// Apply `rule` to every queued target until its queue is empty.
fn propagate_rule(
    proof: &mut Proof,
    system: &dyn FormalSystem,
    rule: RuleId,
    containers: &mut Containers,
    metrics: &mut SolveMetrics,
) -> Result<(), EngineError> {
    let index = system.rule_index();
    let start = Instant::now();
    let mut pass = PassMetrics { rule: index.name(rule), ..PassMetrics::default() };
    let mut closed: BTreeSet<BranchId> = BTreeSet::new();

    while let Some(target) = containers[rule].pop() {
        if closed.contains(&target.branch) || proof.tree.is_branch_closed(target.branch) {
            continue;
        }
        if proof.tree.leaf_node(target.branch)?.history.contains(&target.formula) {
            continue;
        }

        let (layer, created) = use_strict(proof, system, index.name(rule), &target)?;
        pass.applied += 1;

        for &branch in &created {
            if proof.deal_closure(branch)?.is_some() {
                closed.insert(branch);
                pass.closed += 1;
            }
        }
        if created != [target.branch] {
            multiply_for_branches(containers, target.branch, &created);
        }
        append_by_rules(proof, system, containers, &created, layer)?;
    }

    for queue in containers.iter_mut() {
        queue.retain(|t| !closed.contains(&t.branch));
    }
    pass.duration = start.elapsed();
    metrics.record(pass);
    Ok(())
}

/// Decompose one target with the rule's strict form and log the step.
fn use_strict(
    proof: &mut Proof,
    system: &dyn FormalSystem,
    name: &'static str,
    target: &Target,
) -> Result<(usize, Vec<BranchId>), EngineError> {
    let rule = system.rule(name).ok_or_else(|| EngineError::Invariant(format!("rule '{name}' is not registered")))?;
    let decomposition = rule
        .strict(&target.formula)
        .ok_or_else(|| EngineError::Invariant(format!("'{name}' produced nothing for '{}'", target.formula)))?;

    let op = if rule.reusable { HistoryOp::Keep } else { HistoryOp::Add(canonical_key(&target.formula)) };
    let history = vec![op; decomposition.branch_count()];
    let (layer, created) = proof.tree.append(target.branch, decomposition, &history)?;

    proof.used_rules.push(UsedRule {
        layer,
        branch: target.branch,
        rule: name.to_string(),
        context: system.auto_context(name, &target.formula, target.position),
        decisions: Decisions::new(),
        auto: true,
    });
    debug!(rule = name, branch = %target.branch, layer, formula = %target.formula, "applied");
    Ok((layer, created))
}

/// Re-target work queued for a forked branch onto each of its children.
fn multiply_for_branches(containers: &mut Containers, parent: BranchId, children: &[BranchId]) {
    for queue in containers.iter_mut() {
        let mut moved = Vec::new();
        queue.retain(|t| {
            if t.branch == parent {
                moved.push(t.clone());
                false
            } else {
                true
            }
        });
        for target in moved {
            queue.extend(children.iter().map(|&branch| Target { branch, ..target.clone() }));
        }
    }
}

/// Queue the formulas a step just added to each open branch.
fn append_by_rules(
    proof: &Proof,
    system: &dyn FormalSystem,
    containers: &mut Containers,
    branches: &[BranchId],
    layer: usize,
) -> Result<(), EngineError> {
    let index = system.rule_index();
    for &branch in branches {
        if proof.tree.is_branch_closed(branch) {
            continue;
        }
        let leaf = proof.tree.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        for id in proof.tree.path(leaf) {
            let Some(node) = proof.tree.node(id) else { continue };
            if node.layer != layer {
                continue;
            }
            if let Some(rule) = system.find_rule(&node.formula).and_then(|name| index.id(name)) {
                containers[rule].push(Target { formula: node.formula.clone(), branch, position: node.depth });
            }
        }
    }
    Ok(())
}
